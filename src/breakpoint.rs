//! Breakpoint builder
//!
//! Inserting a breakpoint never touches the caller's program. The builder
//! takes a deep copy of the trace so far, appends a measurement of every
//! target qubit into its classical bit, appends the assertion marker, and
//! names the copy with a fresh identity. The caller keeps extending the
//! original; the snapshot is frozen.
//!
//! ```text
//! program:     h(0) ─ u1(0) ─ [insert] ─ barrier ─ qft ─ measure
//!                                │
//! breakpoint:  h(0) ─ u1(0) ─ measure(targets) ─ assertion marker
//! ```

use crate::assertion::Assertion;
use crate::breakpoint_id::{BreakpointId, IdGenerator};
use crate::circuit::{BitSpace, Circuit};
use crate::error::{BreakpointError, Result};
use crate::frequency::FrequencyTable;
use crate::registry::RunRegistry;

/// What the builder needs from a program type
///
/// Implemented for [`Circuit`]; any other program representation can plug in
/// without the core reaching into its definition.
pub trait Program: Sized {
    fn name(&self) -> &str;

    fn bit_space(&self) -> &BitSpace;

    /// Independent deep copy named `name`
    fn snapshot(&self, name: &str) -> Self;

    /// Append a measurement of `qubit` into `clbit`
    fn observe(&mut self, qubit: usize, clbit: usize) -> Result<()>;

    /// Append the marker that closes a breakpoint
    fn mark_assertion(&mut self, id: &BreakpointId);
}

impl Program for Circuit {
    fn name(&self) -> &str {
        Circuit::name(self)
    }

    fn bit_space(&self) -> &BitSpace {
        self.space()
    }

    fn snapshot(&self, name: &str) -> Self {
        self.copy_as(name)
    }

    fn observe(&mut self, qubit: usize, clbit: usize) -> Result<()> {
        self.measure(qubit, clbit).map(|_| ())
    }

    fn mark_assertion(&mut self, id: &BreakpointId) {
        self.push_assertion(id.as_str());
    }
}

/// A frozen program snapshot ending in an observation and an assertion
#[derive(Debug, Clone)]
pub struct Breakpoint<P = Circuit> {
    id: BreakpointId,
    program: P,
    assertion: Assertion,
}

impl<P: Program> Breakpoint<P> {
    pub fn id(&self) -> &BreakpointId {
        &self.id
    }

    /// The snapshot program to hand to the executor
    pub fn program(&self) -> &P {
        &self.program
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    pub fn into_program(self) -> P {
        self.program
    }

    /// Bring executor output down to the assertion's target bits
    ///
    /// Labels over the snapshot's whole classical space are marginalised
    /// onto the assertion's classical bits; labels already as wide as the
    /// target list are used as they are.
    ///
    /// # Errors
    /// `Configuration` if labels have mixed widths or match neither width.
    pub fn project(&self, counts: &FrequencyTable) -> Result<FrequencyTable> {
        let full = self.program.bit_space().num_clbits();
        let target = self.assertion.width();

        match counts.label_width() {
            None if counts.is_empty() => Ok(counts.clone()),
            None => Err(BreakpointError::config(format!(
                "outcome labels for {} have mixed widths",
                self.id
            ))),
            Some(w) if w == full => counts.marginal(self.assertion.clbits()),
            Some(w) if w == target => Ok(counts.clone()),
            Some(w) => Err(BreakpointError::config(format!(
                "outcome labels for {} are {} bits wide, expected {} or {}",
                self.id, w, target, full
            ))),
        }
    }
}

/// Snapshot `program` and attach `assertion`, registering the result
///
/// # Errors
/// `Configuration` if the assertion's bits fall outside the program's bit
/// space or the identity is already registered. The registry is unchanged
/// on error.
pub fn insert<P: Program>(
    program: &P,
    assertion: Assertion,
    ids: &IdGenerator,
    registry: &mut RunRegistry,
) -> Result<Breakpoint<P>> {
    let space = program.bit_space();
    if let Some(q) = assertion.qubits().iter().find(|&&q| q >= space.num_qubits()) {
        return Err(BreakpointError::config(format!(
            "qubit {} outside program '{}' ({} qubits)",
            q,
            program.name(),
            space.num_qubits()
        )));
    }
    if let Some(c) = assertion.clbits().iter().find(|&&c| c >= space.num_clbits()) {
        return Err(BreakpointError::config(format!(
            "classical bit {} outside program '{}' ({} classical bits)",
            c,
            program.name(),
            space.num_clbits()
        )));
    }

    let id = assertion.name(ids);
    let mut snapshot = program.snapshot(id.as_str());
    for (&qubit, &clbit) in assertion.qubits().iter().zip(assertion.clbits()) {
        snapshot.observe(qubit, clbit)?;
    }
    snapshot.mark_assertion(&id);

    registry.register(id.clone(), assertion.clone())?;
    tracing::debug!(
        breakpoint = %id,
        source = program.name(),
        kind = assertion.kind().name(),
        targets = ?assertion.qubits(),
        pcrit = assertion.pcrit(),
        "breakpoint inserted"
    );

    Ok(Breakpoint {
        id,
        program: snapshot,
        assertion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Operation;

    fn prepared() -> Circuit {
        let mut circuit = Circuit::with_size("prog", 2, 2);
        circuit.h(0).unwrap().cx(0, 1).unwrap();
        circuit
    }

    #[test]
    fn test_insert_leaves_original_untouched() {
        let ids = IdGenerator::with_run(0);
        let mut registry = RunRegistry::new();
        let mut circuit = prepared();
        let before = circuit.clone();

        let assertion = Assertion::superposition(circuit.space(), 0..2, 0..2, 0.05).unwrap();
        let bp = insert(&circuit, assertion, &ids, &mut registry).unwrap();

        assert_eq!(circuit, before);
        circuit.x(1).unwrap();
        assert_eq!(bp.program().len(), 2 + 2 + 1);
    }

    #[test]
    fn test_snapshot_layout() {
        let ids = IdGenerator::with_run(4);
        let mut registry = RunRegistry::new();
        let circuit = prepared();

        let assertion = Assertion::classical(circuit.space(), 1, 0, 1, 0.05).unwrap();
        let bp = insert(&circuit, assertion, &ids, &mut registry).unwrap();

        assert_eq!(bp.id().as_str(), "breakpoint_classical_r4_0");
        assert_eq!(bp.program().name(), bp.id().as_str());
        let ops = bp.program().ops();
        assert_eq!(ops[2], Operation::Measure { qubit: 1, clbit: 0 });
        assert_eq!(
            ops[3],
            Operation::Assertion {
                breakpoint: "breakpoint_classical_r4_0".to_string()
            }
        );
        assert!(registry.contains(bp.id().as_str()));
    }

    #[test]
    fn test_insert_rejects_foreign_bits() {
        let ids = IdGenerator::with_run(0);
        let mut registry = RunRegistry::new();
        let wide = Circuit::with_size("wide", 3, 3);
        let narrow = prepared();

        let assertion = Assertion::superposition(wide.space(), 2, 2, 0.05).unwrap();
        let err = insert(&narrow, assertion, &ids, &mut registry).unwrap_err();

        assert!(err.is_configuration());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_project_full_register_labels() {
        let ids = IdGenerator::with_run(0);
        let mut registry = RunRegistry::new();
        let circuit = Circuit::with_size("prog", 3, 3);

        // observe q2 into c2 only
        let assertion = Assertion::classical(circuit.space(), 2, 2, 1, 0.05).unwrap();
        let bp = insert(&circuit, assertion, &ids, &mut registry).unwrap();

        let full = FrequencyTable::from_pairs([("100", 1000), ("000", 24)]);
        let projected = bp.project(&full).unwrap();
        assert_eq!(projected.count("1"), 1000);
        assert_eq!(projected.count("0"), 24);
    }

    #[test]
    fn test_project_target_width_labels_pass_through() {
        let ids = IdGenerator::with_run(0);
        let mut registry = RunRegistry::new();
        let circuit = Circuit::with_size("prog", 3, 3);

        let assertion = Assertion::superposition(circuit.space(), 0..2, 0..2, 0.05).unwrap();
        let bp = insert(&circuit, assertion, &ids, &mut registry).unwrap();

        let counts = FrequencyTable::from_pairs([("00", 5), ("11", 5)]);
        assert_eq!(bp.project(&counts).unwrap(), counts);

        let odd = FrequencyTable::from_pairs([("0", 5)]);
        assert!(bp.project(&odd).unwrap_err().is_configuration());
    }

    #[test]
    fn test_project_mixed_label_widths() {
        let ids = IdGenerator::with_run(0);
        let mut registry = RunRegistry::new();
        let circuit = Circuit::with_size("prog", 2, 2);

        let assertion = Assertion::superposition(circuit.space(), 0, 0, 0.05).unwrap();
        let bp = insert(&circuit, assertion, &ids, &mut registry).unwrap();

        let mixed = FrequencyTable::from_pairs([("0", 1), ("11", 1)]);
        let err = bp.project(&mixed).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("mixed widths"));

        // empty output passes through untouched
        assert!(bp.project(&FrequencyTable::new()).unwrap().is_empty());
    }
}
