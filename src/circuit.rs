//! Minimal program trace: registers plus an ordered list of operations
//!
//! This is the stand-in for the external program/circuit collaborator. The
//! breakpoint machinery only needs its bit-space layout, a deep copy, and the
//! ability to append a measurement and an assertion marker (see
//! [`crate::breakpoint::Program`]).

use crate::error::{BreakpointError, Result};
use serde::{Deserialize, Serialize};

/// Quantum or classical bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    Quantum,
    Classical,
}

/// A named, contiguous block of bits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    pub size: usize,
    pub kind: RegisterKind,
}

impl Register {
    pub fn quantum(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            kind: RegisterKind::Quantum,
        }
    }

    pub fn classical(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            kind: RegisterKind::Classical,
        }
    }
}

/// Register layout of a program; bits are numbered in register order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitSpace {
    registers: Vec<Register>,
}

impl BitSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a register; names are unique across both kinds
    pub fn add_register(&mut self, register: Register) -> Result<()> {
        if self.registers.iter().any(|r| r.name == register.name) {
            return Err(BreakpointError::config(format!(
                "duplicate register name '{}'",
                register.name
            )));
        }
        self.registers.push(register);
        Ok(())
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Total number of bits of `kind`
    pub fn size(&self, kind: RegisterKind) -> usize {
        self.registers
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.size)
            .sum()
    }

    pub fn num_qubits(&self) -> usize {
        self.size(RegisterKind::Quantum)
    }

    pub fn num_clbits(&self) -> usize {
        self.size(RegisterKind::Classical)
    }

    /// Flat index of the first bit of register `name` and its size
    pub fn register_span(&self, name: &str, kind: RegisterKind) -> Option<(usize, usize)> {
        let mut offset = 0;
        for register in self.registers.iter().filter(|r| r.kind == kind) {
            if register.name == name {
                return Some((offset, register.size));
            }
            offset += register.size;
        }
        None
    }
}

/// One step of a program trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Gate {
        name: String,
        qubits: Vec<usize>,
        params: Vec<f64>,
    },
    Barrier {
        qubits: Vec<usize>,
    },
    Measure {
        qubit: usize,
        clbit: usize,
    },
    /// Marks the end of a breakpoint snapshot
    Assertion {
        breakpoint: String,
    },
}

/// A named program over a [`BitSpace`]
///
/// # Example
///
/// ```
/// use qbreak::circuit::{Circuit, Register};
///
/// let mut circuit = Circuit::new("bell");
/// circuit.add_register(Register::quantum("q", 2)).unwrap();
/// circuit.add_register(Register::classical("c", 2)).unwrap();
/// circuit.h(0).unwrap().cx(0, 1).unwrap();
/// assert_eq!(circuit.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    space: BitSpace,
    ops: Vec<Operation>,
}

impl Circuit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            space: BitSpace::new(),
            ops: Vec::new(),
        }
    }

    /// Circuit with one quantum register `q` and one classical register `c`
    pub fn with_size(name: impl Into<String>, qubits: usize, clbits: usize) -> Self {
        let mut space = BitSpace::new();
        space.registers.push(Register::quantum("q", qubits));
        space.registers.push(Register::classical("c", clbits));
        Self {
            name: name.into(),
            space,
            ops: Vec::new(),
        }
    }

    pub fn add_register(&mut self, register: Register) -> Result<()> {
        self.space.add_register(register)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space(&self) -> &BitSpace {
        &self.space
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Deep copy under a new name
    pub fn copy_as(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            space: self.space.clone(),
            ops: self.ops.clone(),
        }
    }

    /// Append an arbitrary gate
    pub fn gate(&mut self, name: &str, qubits: &[usize], params: &[f64]) -> Result<&mut Self> {
        for &q in qubits {
            self.check_qubit(q)?;
        }
        if let Some((i, q)) = qubits
            .iter()
            .enumerate()
            .find(|&(i, q)| qubits[..i].contains(q))
        {
            return Err(BreakpointError::config(format!(
                "gate '{}' repeats qubit {} at argument {}",
                name, q, i
            )));
        }
        self.ops.push(Operation::Gate {
            name: name.to_string(),
            qubits: qubits.to_vec(),
            params: params.to_vec(),
        });
        Ok(self)
    }

    pub fn h(&mut self, qubit: usize) -> Result<&mut Self> {
        self.gate("h", &[qubit], &[])
    }

    pub fn x(&mut self, qubit: usize) -> Result<&mut Self> {
        self.gate("x", &[qubit], &[])
    }

    pub fn u1(&mut self, theta: f64, qubit: usize) -> Result<&mut Self> {
        self.gate("u1", &[qubit], &[theta])
    }

    pub fn cx(&mut self, control: usize, target: usize) -> Result<&mut Self> {
        self.gate("cx", &[control, target], &[])
    }

    pub fn cu1(&mut self, theta: f64, control: usize, target: usize) -> Result<&mut Self> {
        self.gate("cu1", &[control, target], &[theta])
    }

    /// Barrier across every qubit
    pub fn barrier(&mut self) -> &mut Self {
        let qubits = (0..self.space.num_qubits()).collect();
        self.ops.push(Operation::Barrier { qubits });
        self
    }

    pub fn measure(&mut self, qubit: usize, clbit: usize) -> Result<&mut Self> {
        self.check_qubit(qubit)?;
        if clbit >= self.space.num_clbits() {
            return Err(BreakpointError::config(format!(
                "classical bit {} out of range ({} classical bits)",
                clbit,
                self.space.num_clbits()
            )));
        }
        self.ops.push(Operation::Measure { qubit, clbit });
        Ok(self)
    }

    pub(crate) fn push_assertion(&mut self, breakpoint: &str) {
        self.ops.push(Operation::Assertion {
            breakpoint: breakpoint.to_string(),
        });
    }

    fn check_qubit(&self, qubit: usize) -> Result<()> {
        if qubit >= self.space.num_qubits() {
            return Err(BreakpointError::config(format!(
                "qubit {} out of range ({} qubits)",
                qubit,
                self.space.num_qubits()
            )));
        }
        Ok(())
    }
}
