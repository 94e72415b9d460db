//! Outcome histograms returned by the execution collaborator
//!
//! Labels are bitstrings with bit 0 as the rightmost character. Register
//! separators (spaces, as in `"01 10"`) are ignored when labels are read.

use crate::error::{BreakpointError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Widest outcome space enumerated category by category (2^24 cells)
pub const MAX_DENSE_BITS: usize = 24;

/// Mapping from outcome label to the number of trials producing it
///
/// # Example
///
/// ```
/// use qbreak::frequency::FrequencyTable;
///
/// let counts = FrequencyTable::from_pairs([("00", 512), ("11", 512)]);
/// assert_eq!(counts.shots(), 1024);
/// assert_eq!(counts.count("01"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    counts: BTreeMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (label, count) in pairs {
            table.add(label, count);
        }
        table
    }

    /// Add `count` trials to `label` (accumulates on repeats)
    ///
    /// Saturates at `u64::MAX`; use [`try_add`](Self::try_add) to detect it.
    pub fn add(&mut self, label: impl Into<String>, count: u64) {
        let slot = self.counts.entry(label.into()).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    /// Like [`add`](Self::add), but overflow is a `Computation` error
    pub fn try_add(&mut self, label: impl Into<String>, count: u64) -> Result<()> {
        let slot = self.counts.entry(label.into()).or_insert(0);
        *slot = add_counts(*slot, count)?;
        Ok(())
    }

    /// Count for `label`, zero when absent
    pub fn count(&self, label: &str) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Total number of trials, saturating at `u64::MAX`
    pub fn shots(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Total number of trials
    ///
    /// # Errors
    /// `Computation` if the total does not fit in a `u64`.
    pub fn total(&self) -> Result<u64> {
        checked_total(self.counts.values().copied())
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Width of the labels, if they all agree (separators excluded)
    pub fn label_width(&self) -> Option<usize> {
        let mut widths = self.counts.keys().map(|k| bits_of(k).len());
        let first = widths.next()?;
        widths.all(|w| w == first).then_some(first)
    }

    /// Counts indexed by outcome value over `width` bits
    ///
    /// Position `v` holds the count of the label whose binary value is `v`;
    /// outcomes missing from the table are zero.
    ///
    /// # Errors
    /// `Configuration` if a label is not `width` binary digits.
    pub fn dense(&self, width: usize) -> Result<Vec<u64>> {
        if width > MAX_DENSE_BITS {
            return Err(BreakpointError::config(format!(
                "{} bits is too wide for a dense table (max {})",
                width, MAX_DENSE_BITS
            )));
        }
        let mut dense = vec![0u64; 1 << width];
        for (label, count) in &self.counts {
            let bits = parse_label(label, width)?;
            let slot = &mut dense[value_of(&bits)];
            *slot = add_counts(*slot, *count)?;
        }
        Ok(dense)
    }

    /// Project labels onto a subset of classical bits
    ///
    /// `clbits[i]` becomes bit `i` of the projected label (so `clbits[0]` is
    /// the rightmost character). Counts of labels that collapse onto the same
    /// projection are summed.
    ///
    /// ```
    /// use qbreak::frequency::FrequencyTable;
    ///
    /// // 3 classical bits, keep bits 2 and 0
    /// let full = FrequencyTable::from_pairs([("100", 10), ("001", 20), ("101", 5)]);
    /// let marginal = full.marginal(&[0, 2]).unwrap();
    /// assert_eq!(marginal.count("10"), 10);
    /// assert_eq!(marginal.count("01"), 20);
    /// assert_eq!(marginal.count("11"), 5);
    /// ```
    pub fn marginal(&self, clbits: &[usize]) -> Result<FrequencyTable> {
        let mut projected = FrequencyTable::new();
        for (label, count) in &self.counts {
            let bits = bits_of(label);
            let width = bits.len();
            let mut out = String::with_capacity(clbits.len());
            for &clbit in clbits.iter().rev() {
                if clbit >= width {
                    return Err(BreakpointError::config(format!(
                        "classical bit {} outside {}-bit label '{}'",
                        clbit, width, label
                    )));
                }
                out.push(bits[width - 1 - clbit]);
            }
            projected.try_add(out, *count)?;
        }
        Ok(projected)
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

fn bits_of(label: &str) -> Vec<char> {
    label.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `a + b`, or a `Computation` error on overflow
pub(crate) fn add_counts(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| {
        BreakpointError::computation(format!("count total overflows: {} + {}", a, b))
    })
}

/// Sum of `counts`, or a `Computation` error on overflow
pub(crate) fn checked_total(counts: impl IntoIterator<Item = u64>) -> Result<u64> {
    counts.into_iter().try_fold(0u64, add_counts)
}

/// Validate a label of exactly `width` binary digits; returns its characters
pub(crate) fn parse_label(label: &str, width: usize) -> Result<Vec<char>> {
    let bits = bits_of(label);
    if bits.len() != width {
        return Err(BreakpointError::config(format!(
            "outcome label '{}' has {} bits, expected {}",
            label,
            bits.len(),
            width
        )));
    }
    if let Some(bad) = bits.iter().find(|c| **c != '0' && **c != '1') {
        return Err(BreakpointError::config(format!(
            "outcome label '{}' contains non-binary symbol '{}'",
            label, bad
        )));
    }
    Ok(bits)
}

/// Binary value of a validated bit slice (leftmost = most significant)
pub(crate) fn value_of(bits: &[char]) -> usize {
    bits.iter()
        .fold(0usize, |acc, &b| (acc << 1) | usize::from(b == '1'))
}
