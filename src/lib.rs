//! qbreak - statistical breakpoints for quantum programs
//!
//! A breakpoint is a frozen copy of a program up to some point, ending in a
//! measurement of chosen qubits and a claim about the resulting outcome
//! distribution. After the batch runs, each breakpoint's frequency table is
//! put through a chi-square test and the claim is judged at its significance
//! level:
//!
//! - superposition: outcomes are uniform (goodness-of-fit)
//! - classical: outcomes collapse onto one value (goodness-of-fit)
//! - product: two bit groups are dependent (independence test)
//!
//! # Example
//!
//! ```
//! use qbreak::circuit::Circuit;
//! use qbreak::collector::{ExecutionOutput, RunContext};
//! use qbreak::frequency::FrequencyTable;
//!
//! let mut ctx = RunContext::new();
//! let mut circuit = Circuit::with_size("prog", 1, 1);
//! circuit.h(0).unwrap();
//!
//! let bp = ctx.insert_superposition(&circuit, 0, 0, 0.05).unwrap();
//!
//! let mut output = ExecutionOutput::new();
//! output.insert(bp.id().to_string(), FrequencyTable::from_pairs([("0", 509), ("1", 515)]));
//!
//! let report = ctx.collect(&[bp.clone()], &output).unwrap();
//! let (_, p_value, passed) = report.triple(&bp).unwrap();
//! assert!(passed && p_value > 0.05);
//! ```

pub mod assertion;
pub mod breakpoint;
pub mod breakpoint_id;
pub mod circuit;
pub mod collector;
pub mod error;
pub mod frequency;
pub mod registry;
pub mod selector;
pub mod stat_test;

pub use assertion::{Assertion, AssertionKind};
pub use breakpoint::{Breakpoint, Program};
pub use breakpoint_id::{BreakpointId, IdGenerator};
pub use circuit::Circuit;
pub use collector::{BreakpointReport, ExecutionOutput, Executor, RunContext};
pub use error::{BreakpointError, Result};
pub use frequency::FrequencyTable;
pub use selector::{BitRef, BitSelector};
pub use stat_test::{EngineConfig, StatResult};
