//! Run context and result collection
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Statistical breakpoint flow                                       │
//! └──────────────────────────────────────────────────────────────────┘
//!
//! 1. RunContext::new()            → fresh registry + id generator
//! 2. ctx.insert_*(&program, …)    → Breakpoint (snapshot + assertion)
//! 3. Executor::execute([program, bp₁ … bpₙ], shots)
//!                                 → identity → FrequencyTable
//! 4. ctx.collect(&bps, &output)   → BreakpointReport (identity → StatResult)
//! ```
//!
//! The context is the only state: it owns the registry of the run and is
//! threaded explicitly through insertion and collection. Two contexts never
//! share entries, so programs can be built on separate threads, one context
//! each.

use crate::assertion::Assertion;
use crate::breakpoint::{self, Breakpoint, Program};
use crate::breakpoint_id::{BreakpointId, IdGenerator};
use crate::error::{BreakpointError, Result};
use crate::frequency::FrequencyTable;
use crate::registry::RunRegistry;
use crate::selector::BitSelector;
use crate::stat_test::{EngineConfig, StatResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Executor output: program name (breakpoint identity) → outcome counts
pub type ExecutionOutput = BTreeMap<String, FrequencyTable>;

/// External execution collaborator
///
/// Runs a batch of programs for `shots` trials each and returns one
/// frequency table per program, keyed by program name. Each table's counts
/// sum to `shots`.
pub trait Executor<P> {
    fn execute(&self, programs: &[&P], shots: u64) -> anyhow::Result<ExecutionOutput>;
}

/// Per-breakpoint results of one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakpointReport {
    results: BTreeMap<BreakpointId, StatResult>,
}

impl BreakpointReport {
    pub fn get(&self, id: &str) -> Option<&StatResult> {
        self.results.get(id)
    }

    /// `(statistic, p_value, passed)` for `breakpoint`
    pub fn triple<P: Program>(&self, breakpoint: &Breakpoint<P>) -> Option<(f64, f64, bool)> {
        self.get(breakpoint.id().as_str()).map(StatResult::triple)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BreakpointId, &StatResult)> {
        self.results.iter()
    }

    pub fn all_passed(&self) -> bool {
        self.results.values().all(|r| r.passed)
    }

    /// Identities of failed assertions, in identity order
    pub fn failed(&self) -> Vec<&BreakpointId> {
        self.results
            .iter()
            .filter(|(_, r)| !r.passed)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.results)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let failed = self.failed();
        let mut report = String::new();

        if failed.is_empty() {
            report.push_str(&format!(
                "✅ ALL ASSERTIONS PASSED ({} breakpoints)\n",
                self.results.len()
            ));
        } else {
            report.push_str(&format!(
                "❌ {} OF {} ASSERTIONS FAILED\n",
                failed.len(),
                self.results.len()
            ));
        }

        if !self.results.is_empty() {
            report.push_str("\n📊 Statistical Tests:\n");
            for (id, result) in &self.results {
                report.push_str(&format!(
                    "  {} {} (chi2={:.4}, p={:.4})\n",
                    if result.passed { "PASS" } else { "FAIL" },
                    id,
                    result.statistic,
                    result.p_value
                ));
            }
        }

        report
    }
}

/// Explicit state of one program-build session
#[derive(Debug)]
pub struct RunContext {
    ids: IdGenerator,
    registry: RunRegistry,
    config: EngineConfig,
}

impl RunContext {
    /// Context with default engine settings and the next process-wide run id
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
            registry: RunRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    /// Context with validated engine settings
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Context with an injected id generator (deterministic identities)
    pub fn with_ids(ids: IdGenerator, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ids,
            registry: RunRegistry::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub fn run(&self) -> u64 {
        self.ids.run()
    }

    /// Insert a breakpoint carrying a prebuilt (possibly negated) assertion
    pub fn insert<P: Program>(&mut self, program: &P, assertion: Assertion) -> Result<Breakpoint<P>> {
        breakpoint::insert(program, assertion, &self.ids, &mut self.registry)
    }

    /// Breakpoint asserting the targets are in uniform superposition
    ///
    /// # Example
    /// ```
    /// use qbreak::circuit::Circuit;
    /// use qbreak::collector::RunContext;
    ///
    /// let mut ctx = RunContext::new();
    /// let mut circuit = Circuit::with_size("prog", 2, 2);
    /// circuit.h(0).unwrap().h(1).unwrap();
    ///
    /// let bp = ctx.insert_superposition(&circuit, 0..2, 0..2, 0.05).unwrap();
    /// assert_eq!(circuit.len(), 2); // original untouched
    /// assert_eq!(bp.program().len(), 5);
    /// ```
    pub fn insert_superposition<P: Program>(
        &mut self,
        program: &P,
        qubits: impl Into<BitSelector>,
        clbits: impl Into<BitSelector>,
        pcrit: f64,
    ) -> Result<Breakpoint<P>> {
        let assertion = Assertion::superposition(program.bit_space(), qubits, clbits, pcrit)?;
        self.insert(program, assertion)
    }

    /// Breakpoint asserting the targets read out as `expected`
    pub fn insert_classical<P: Program>(
        &mut self,
        program: &P,
        qubits: impl Into<BitSelector>,
        clbits: impl Into<BitSelector>,
        expected: u64,
        pcrit: f64,
    ) -> Result<Breakpoint<P>> {
        let assertion =
            Assertion::classical(program.bit_space(), qubits, clbits, expected, pcrit)?;
        self.insert(program, assertion)
    }

    /// Breakpoint asserting two target groups are measured dependently
    pub fn insert_product<P: Program>(
        &mut self,
        program: &P,
        qubits0: impl Into<BitSelector>,
        clbits0: impl Into<BitSelector>,
        qubits1: impl Into<BitSelector>,
        clbits1: impl Into<BitSelector>,
        pcrit: f64,
    ) -> Result<Breakpoint<P>> {
        let assertion = Assertion::product(
            program.bit_space(),
            qubits0,
            clbits0,
            qubits1,
            clbits1,
            pcrit,
        )?;
        self.insert(program, assertion)
    }

    /// [`insert_superposition`](Self::insert_superposition) at the configured significance
    pub fn insert_superposition_default<P: Program>(
        &mut self,
        program: &P,
        qubits: impl Into<BitSelector>,
        clbits: impl Into<BitSelector>,
    ) -> Result<Breakpoint<P>> {
        let pcrit = self.config.default_significance;
        self.insert_superposition(program, qubits, clbits, pcrit)
    }

    /// [`insert_classical`](Self::insert_classical) at the configured significance
    pub fn insert_classical_default<P: Program>(
        &mut self,
        program: &P,
        qubits: impl Into<BitSelector>,
        clbits: impl Into<BitSelector>,
        expected: u64,
    ) -> Result<Breakpoint<P>> {
        let pcrit = self.config.default_significance;
        self.insert_classical(program, qubits, clbits, expected, pcrit)
    }

    /// [`insert_product`](Self::insert_product) at the configured significance
    pub fn insert_product_default<P: Program>(
        &mut self,
        program: &P,
        qubits0: impl Into<BitSelector>,
        clbits0: impl Into<BitSelector>,
        qubits1: impl Into<BitSelector>,
        clbits1: impl Into<BitSelector>,
    ) -> Result<Breakpoint<P>> {
        let pcrit = self.config.default_significance;
        self.insert_product(program, qubits0, clbits0, qubits1, clbits1, pcrit)
    }

    /// Evaluate every breakpoint against its frequency table
    ///
    /// Pure with respect to the context: calling it twice with the same
    /// inputs yields identical reports.
    ///
    /// # Errors
    /// - `NotFound` if a breakpoint has no table in `output` or was not
    ///   inserted through this context
    /// - `Configuration` / `Computation` from projection or the test engine,
    ///   tagged with the breakpoint identity
    pub fn collect<P: Program>(
        &self,
        breakpoints: &[Breakpoint<P>],
        output: &ExecutionOutput,
    ) -> Result<BreakpointReport> {
        let mut results = BTreeMap::new();

        for bp in breakpoints {
            let id = bp.id();
            let assertion = self.registry.lookup(id.as_str())?;
            let counts = output.get(id.as_str()).ok_or_else(|| {
                BreakpointError::NotFound(format!("{} (no frequency table in execution output)", id))
            })?;

            let result = bp
                .project(counts)
                .and_then(|targets| assertion.evaluate(&targets, &self.config))
                .map_err(|e| {
                    tracing::warn!(breakpoint = %id, error = %e, "assertion could not be evaluated");
                    e.for_breakpoint(id.as_str())
                })?;

            results.insert(id.clone(), result);
        }

        let report = BreakpointReport { results };
        tracing::info!(
            run = self.ids.run(),
            breakpoints = report.len(),
            failed = report.failed().len(),
            "breakpoints collected"
        );
        Ok(report)
    }

    /// Run `{program, breakpoints…}` as one batch and collect the results
    ///
    /// Returns the report and the counts of `program` itself.
    ///
    /// # Errors
    /// Executor failures, tables whose counts do not sum to `shots`, and
    /// everything [`collect`](Self::collect) reports.
    pub fn execute_and_collect<P, E>(
        &self,
        executor: &E,
        program: &P,
        breakpoints: &[Breakpoint<P>],
        shots: u64,
    ) -> anyhow::Result<(BreakpointReport, Option<FrequencyTable>)>
    where
        P: Program,
        E: Executor<P>,
    {
        let mut programs: Vec<&P> = Vec::with_capacity(breakpoints.len() + 1);
        programs.push(program);
        programs.extend(breakpoints.iter().map(Breakpoint::program));

        let output = executor.execute(&programs, shots)?;

        for bp in breakpoints {
            if let Some(counts) = output.get(bp.id().as_str()) {
                if counts.shots() != shots {
                    return Err(BreakpointError::computation(format!(
                        "{}: frequency table holds {} trials, expected {}",
                        bp.id(),
                        counts.shots(),
                        shots
                    ))
                    .into());
                }
            }
        }

        let report = self.collect(breakpoints, &output)?;
        Ok((report, output.get(program.name()).cloned()))
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
