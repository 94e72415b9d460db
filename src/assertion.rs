//! Statistical assertions attached to breakpoints
//!
//! An assertion observes a set of target qubits into classical bits and makes
//! one claim about the distribution of the outcomes:
//!
//! | Variant         | Claim                                   | Test             | Passes when      |
//! |-----------------|-----------------------------------------|------------------|------------------|
//! | `Superposition` | outcomes are uniform over all 2^k values | goodness-of-fit  | p > pcrit        |
//! | `Classical`     | outcomes collapse onto `expected`        | goodness-of-fit  | p > pcrit        |
//! | `Product`       | two bit groups are measured dependently  | independence     | p <= pcrit       |
//!
//! `negate` flips the verdict of any variant.
//!
//! # Outcome labels
//!
//! The table handed to [`Assertion::stat_test`] is over the target bits only:
//! target bit `i` is character `k - 1 - i` of a `k`-bit label (bit 0 is the
//! rightmost character). For a product assertion the targets are group 0
//! followed by group 1, so the rightmost characters of a label belong to
//! group 0 and the leftmost ones to group 1.

use crate::breakpoint_id::{BreakpointId, IdGenerator};
use crate::circuit::{BitSpace, RegisterKind};
use crate::error::{BreakpointError, Result};
use crate::frequency::{add_counts, parse_label, value_of, FrequencyTable, MAX_DENSE_BITS};
use crate::selector::BitSelector;
use crate::stat_test::{
    goodness_of_fit, independence_test, validate_pcrit, EngineConfig, ExpectedShape, Polarity,
    StatResult,
};
use serde::{Deserialize, Serialize};

/// The claim an assertion makes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssertionKind {
    /// Equal-weight superposition of the target bits
    Superposition,

    /// The target bits read out as `expected` (bit 0 least significant)
    Classical { expected: u64 },

    /// Group 0 (the first `split` targets) and group 1 (the rest) are
    /// statistically dependent
    Product { split: usize },
}

impl AssertionKind {
    pub fn name(&self) -> &'static str {
        match self {
            AssertionKind::Superposition => "superposition",
            AssertionKind::Classical { .. } => "classical",
            AssertionKind::Product { .. } => "product",
        }
    }

    /// Which side of pcrit counts as a pass
    pub fn polarity(&self) -> Polarity {
        match self {
            AssertionKind::Superposition | AssertionKind::Classical { .. } => {
                Polarity::FailToReject
            }
            AssertionKind::Product { .. } => Polarity::Reject,
        }
    }
}

/// One statistical claim over resolved target bits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    kind: AssertionKind,
    qubits: Vec<usize>,
    clbits: Vec<usize>,
    pcrit: f64,
    negate: bool,
}

impl Assertion {
    /// Claim the target qubits are in an equal-weight superposition
    ///
    /// # Example
    /// ```
    /// use qbreak::assertion::Assertion;
    /// use qbreak::circuit::Circuit;
    /// use qbreak::frequency::FrequencyTable;
    ///
    /// let circuit = Circuit::with_size("c", 2, 2);
    /// let assertion = Assertion::superposition(circuit.space(), 0..2, 0..2, 0.05).unwrap();
    ///
    /// let counts = FrequencyTable::from_pairs([("00", 256), ("01", 256), ("10", 256), ("11", 256)]);
    /// assert!(assertion.stat_test(&counts).unwrap().passed);
    /// ```
    pub fn superposition(
        space: &BitSpace,
        qubits: impl Into<BitSelector>,
        clbits: impl Into<BitSelector>,
        pcrit: f64,
    ) -> Result<Self> {
        let (qubits, clbits) = resolve_pair(space, &qubits.into(), &clbits.into())?;
        Self::build(AssertionKind::Superposition, qubits, clbits, pcrit)
    }

    /// Claim the target qubits read out as `expected`
    ///
    /// # Errors
    /// `Configuration` if `expected` does not fit in the target width.
    pub fn classical(
        space: &BitSpace,
        qubits: impl Into<BitSelector>,
        clbits: impl Into<BitSelector>,
        expected: u64,
        pcrit: f64,
    ) -> Result<Self> {
        let (qubits, clbits) = resolve_pair(space, &qubits.into(), &clbits.into())?;
        let width = qubits.len();
        if width < u64::BITS as usize && expected >> width != 0 {
            return Err(BreakpointError::config(format!(
                "expected value {} does not fit in {} target bits",
                expected, width
            )));
        }
        Self::build(AssertionKind::Classical { expected }, qubits, clbits, pcrit)
    }

    /// Claim the outcomes of two disjoint bit groups are dependent
    ///
    /// # Errors
    /// `Configuration` if the groups share a qubit or a classical bit.
    pub fn product(
        space: &BitSpace,
        qubits0: impl Into<BitSelector>,
        clbits0: impl Into<BitSelector>,
        qubits1: impl Into<BitSelector>,
        clbits1: impl Into<BitSelector>,
        pcrit: f64,
    ) -> Result<Self> {
        let (mut qubits, mut clbits) = resolve_pair(space, &qubits0.into(), &clbits0.into())?;
        let (qubits1, clbits1) = resolve_pair(space, &qubits1.into(), &clbits1.into())?;

        if let Some(q) = qubits1.iter().find(|q| qubits.contains(*q)) {
            return Err(BreakpointError::config(format!(
                "product groups overlap on qubit {}",
                q
            )));
        }
        if let Some(c) = clbits1.iter().find(|c| clbits.contains(*c)) {
            return Err(BreakpointError::config(format!(
                "product groups overlap on classical bit {}",
                c
            )));
        }

        let split = qubits.len();
        qubits.extend(qubits1);
        clbits.extend(clbits1);
        Self::build(AssertionKind::Product { split }, qubits, clbits, pcrit)
    }

    fn build(
        kind: AssertionKind,
        qubits: Vec<usize>,
        clbits: Vec<usize>,
        pcrit: f64,
    ) -> Result<Self> {
        validate_pcrit(pcrit)?;
        if qubits.len() > MAX_DENSE_BITS {
            return Err(BreakpointError::config(format!(
                "{} target bits exceeds the maximum of {}",
                qubits.len(),
                MAX_DENSE_BITS
            )));
        }
        Ok(Self {
            kind,
            qubits,
            clbits,
            pcrit,
            negate: false,
        })
    }

    /// Assert the opposite of the stated claim
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn kind(&self) -> &AssertionKind {
        &self.kind
    }

    /// Target qubits, flat and ordered
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    /// Classical bits the targets are observed into, parallel to `qubits`
    pub fn clbits(&self) -> &[usize] {
        &self.clbits
    }

    pub fn pcrit(&self) -> f64 {
        self.pcrit
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Number of target bits (label width)
    pub fn width(&self) -> usize {
        self.qubits.len()
    }

    /// Group 0 and group 1 qubits of a product assertion
    pub fn groups(&self) -> Option<(&[usize], &[usize])> {
        match self.kind {
            AssertionKind::Product { split } => Some(self.qubits.split_at(split)),
            _ => None,
        }
    }

    /// Fresh identity for the breakpoint carrying this assertion
    pub fn name(&self, ids: &IdGenerator) -> BreakpointId {
        ids.next_id(self.kind.name())
    }

    /// Evaluate against a target-width frequency table with default settings
    pub fn stat_test(&self, counts: &FrequencyTable) -> Result<StatResult> {
        self.evaluate(counts, &EngineConfig::default())
    }

    /// Evaluate against a target-width frequency table
    ///
    /// # Errors
    /// `Configuration` for labels that are not `width()` binary digits;
    /// `Computation` for degenerate tables.
    pub fn evaluate(&self, counts: &FrequencyTable, config: &EngineConfig) -> Result<StatResult> {
        let test = match &self.kind {
            AssertionKind::Superposition => {
                let observed = counts.dense(self.width())?;
                goodness_of_fit(&observed, &ExpectedShape::Uniform)?
            }
            AssertionKind::Classical { expected } => {
                let observed = counts.dense(self.width())?;
                let shape = ExpectedShape::PointMass {
                    index: *expected as usize,
                    weight: config.point_mass_weight,
                };
                goodness_of_fit(&observed, &shape)?
            }
            AssertionKind::Product { split } => {
                let table = self.contingency_table(counts, *split)?;
                independence_test(&table, config.yates_correction)?
            }
        };

        let result = StatResult::from_test(&test, self.kind.polarity(), self.pcrit, self.negate);
        tracing::debug!(
            kind = self.kind.name(),
            statistic = result.statistic,
            p_value = result.p_value,
            df = test.df,
            passed = result.passed,
            "assertion evaluated"
        );
        Ok(result)
    }

    /// Rows enumerate group 0 outcomes, columns group 1 outcomes
    fn contingency_table(&self, counts: &FrequencyTable, split: usize) -> Result<Vec<Vec<u64>>> {
        let width = self.width();
        let group1_width = width - split;
        let mut table = vec![vec![0u64; 1 << group1_width]; 1 << split];

        for (label, count) in counts.iter() {
            let bits = parse_label(label, width)?;
            let (group1, group0) = bits.split_at(group1_width);
            let cell = &mut table[value_of(group0)][value_of(group1)];
            *cell = add_counts(*cell, count)?;
        }
        Ok(table)
    }
}

fn resolve_pair(
    space: &BitSpace,
    qubits: &BitSelector,
    clbits: &BitSelector,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let qubits = qubits.resolve(space, RegisterKind::Quantum)?;
    let clbits = clbits.resolve(space, RegisterKind::Classical)?;
    if qubits.len() != clbits.len() {
        return Err(BreakpointError::config(format!(
            "{} target qubits observed into {} classical bits",
            qubits.len(),
            clbits.len()
        )));
    }
    Ok((qubits, clbits))
}
