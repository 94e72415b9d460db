// Pearson chi-square statistics over frequency tables
//
// - goodness_of_fit: observed counts vs an expected shape, df = k - 1
// - independence_test: two-way contingency table, df = (r - 1)(c - 1)
//
// P-values come from the chi-square survival function (statrs). Degenerate
// tables are reported as errors instead of producing NaN.

use crate::error::{BreakpointError, Result};
use crate::frequency::checked_total;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Differences at or below this (relative to the expected count) are treated
/// as an exact match, so proportional tables yield p = 1.0.
const EXACT_MATCH_TOLERANCE: f64 = 1e-9;

/// Result of a chi-square test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareTest {
    /// Pearson chi-square statistic
    pub statistic: f64,

    /// Upper-tail probability of the statistic, in [0, 1]
    pub pvalue: f64,

    /// Degrees of freedom
    pub df: usize,
}

/// Shape of the distribution the observed counts are compared against
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedShape {
    /// Equal weight on every category
    Uniform,

    /// One category carries `weight`, every other category weight 1
    PointMass { index: usize, weight: f64 },

    /// Explicit relative weights, one per category
    ///
    /// No assertion kind builds this shape; it is for callers running the
    /// engine directly against a distribution of their own.
    Weights(Vec<f64>),
}

impl ExpectedShape {
    /// Scale the shape to expected frequencies summing to `total`
    fn frequencies(&self, categories: usize, total: f64) -> Result<Vec<f64>> {
        let weights = match self {
            ExpectedShape::Uniform => vec![1.0; categories],
            ExpectedShape::PointMass { index, weight } => {
                if *index >= categories {
                    return Err(BreakpointError::config(format!(
                        "point mass index {} outside {} categories",
                        index, categories
                    )));
                }
                let mut w = vec![1.0; categories];
                w[*index] = *weight;
                w
            }
            ExpectedShape::Weights(w) => {
                if w.len() != categories {
                    return Err(BreakpointError::config(format!(
                        "expected shape has {} weights for {} categories",
                        w.len(),
                        categories
                    )));
                }
                w.clone()
            }
        };

        let weight_sum: f64 = weights.iter().sum();
        if !weight_sum.is_finite() || weight_sum <= 0.0 {
            return Err(BreakpointError::computation(format!(
                "expected shape has non-positive total weight {}",
                weight_sum
            )));
        }

        Ok(weights.iter().map(|w| total * w / weight_sum).collect())
    }
}

/// Goodness-of-fit test of `observed` against `shape`
///
/// Categories are the positions of `observed`; absent outcomes must be
/// passed as explicit zeros.
///
/// # Errors
/// `Computation` if there are fewer than two categories, the table is empty,
/// or any expected frequency is non-positive.
///
/// # Example
/// ```
/// use qbreak::stat_test::{goodness_of_fit, ExpectedShape};
///
/// let test = goodness_of_fit(&[256, 256, 256, 256], &ExpectedShape::Uniform).unwrap();
/// assert_eq!(test.statistic, 0.0);
/// assert_eq!(test.pvalue, 1.0);
/// assert_eq!(test.df, 3);
/// ```
pub fn goodness_of_fit(observed: &[u64], shape: &ExpectedShape) -> Result<ChiSquareTest> {
    if observed.len() < 2 {
        return Err(BreakpointError::computation(format!(
            "goodness-of-fit needs at least 2 categories, got {}",
            observed.len()
        )));
    }

    let total = checked_total(observed.iter().copied())?;
    if total == 0 {
        return Err(BreakpointError::computation(
            "goodness-of-fit on an empty frequency table",
        ));
    }

    let expected = shape.frequencies(observed.len(), total as f64)?;
    if let Some((i, e)) = expected
        .iter()
        .enumerate()
        .find(|(_, e)| !e.is_finite() || **e <= 0.0)
    {
        return Err(BreakpointError::computation(format!(
            "expected frequency for category {} is {}",
            i, e
        )));
    }

    let statistic = observed
        .iter()
        .zip(&expected)
        .map(|(&o, &e)| pearson_term(o as f64 - e, e, false))
        .sum();

    let df = observed.len() - 1;
    Ok(ChiSquareTest {
        statistic,
        pvalue: survival(statistic, df)?,
        df,
    })
}

/// Chi-square test of independence over a contingency table
///
/// `table[row][col]` holds the joint count. When `yates_correction` is set
/// and the table has one degree of freedom, each |observed - expected| is
/// reduced by up to 0.5 before squaring.
///
/// # Errors
/// `Configuration` for ragged tables; `Computation` for tables smaller than
/// 2x2 or with any row or column summing to zero.
///
/// # Example
/// ```
/// use qbreak::stat_test::independence_test;
///
/// let table = vec![vec![10, 20], vec![30, 60]];
/// let test = independence_test(&table, true).unwrap();
/// assert_eq!(test.pvalue, 1.0);
/// ```
pub fn independence_test(table: &[Vec<u64>], yates_correction: bool) -> Result<ChiSquareTest> {
    let rows = table.len();
    let cols = table.first().map(Vec::len).unwrap_or(0);
    if let Some(r) = table.iter().position(|row| row.len() != cols) {
        return Err(BreakpointError::config(format!(
            "contingency table row {} has {} columns, expected {}",
            r,
            table[r].len(),
            cols
        )));
    }
    if rows < 2 || cols < 2 {
        return Err(BreakpointError::computation(format!(
            "independence test needs at least a 2x2 table, got {}x{}",
            rows, cols
        )));
    }

    let row_sums = table
        .iter()
        .map(|row| checked_total(row.iter().copied()))
        .collect::<Result<Vec<_>>>()?;
    let col_sums = (0..cols)
        .map(|c| checked_total(table.iter().map(|row| row[c])))
        .collect::<Result<Vec<_>>>()?;

    if let Some(r) = row_sums.iter().position(|&s| s == 0) {
        return Err(BreakpointError::computation(format!(
            "contingency table row {} sums to zero",
            r
        )));
    }
    if let Some(c) = col_sums.iter().position(|&s| s == 0) {
        return Err(BreakpointError::computation(format!(
            "contingency table column {} sums to zero",
            c
        )));
    }

    let total = checked_total(row_sums.iter().copied())?;
    let df = (rows - 1) * (cols - 1);
    let correct = yates_correction && df == 1;

    let mut statistic = 0.0;
    for (r, row) in table.iter().enumerate() {
        for (c, &observed) in row.iter().enumerate() {
            let expected = row_sums[r] as f64 * col_sums[c] as f64 / total as f64;
            statistic += pearson_term(observed as f64 - expected, expected, correct);
        }
    }

    Ok(ChiSquareTest {
        statistic,
        pvalue: survival(statistic, df)?,
        df,
    })
}

/// (|o - e| - correction)^2 / e, with near-exact matches snapped to zero
fn pearson_term(diff: f64, expected: f64, yates: bool) -> f64 {
    let mut magnitude = diff.abs();
    if magnitude <= EXACT_MATCH_TOLERANCE * expected.max(1.0) {
        return 0.0;
    }
    if yates {
        magnitude -= magnitude.min(0.5);
    }
    magnitude * magnitude / expected
}

fn survival(statistic: f64, df: usize) -> Result<f64> {
    let dist = ChiSquared::new(df as f64)
        .map_err(|e| BreakpointError::computation(format!("chi-square df={}: {}", df, e)))?;
    let pvalue = dist.sf(statistic);
    if pvalue.is_nan() {
        return Err(BreakpointError::computation(format!(
            "p-value undefined for statistic {} (df={})",
            statistic, df
        )));
    }
    Ok(pvalue.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_exact_match() {
        let result = goodness_of_fit(&[256, 256, 256, 256], &ExpectedShape::Uniform).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.pvalue, 1.0);
        assert_eq!(result.df, 3);
    }

    #[test]
    fn test_proportional_weights_exact_match() {
        let shape = ExpectedShape::Weights(vec![1.0, 3.0]);
        let result = goodness_of_fit(&[250, 750], &shape).unwrap();
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn test_uniform_rejects_collapsed_table() {
        let result = goodness_of_fit(&[1024, 0], &ExpectedShape::Uniform).unwrap();
        // (1024-512)^2/512 * 2 = 1024
        assert!((result.statistic - 1024.0).abs() < 1e-9);
        assert!(result.pvalue < 1e-10);
    }

    #[test]
    fn test_known_statistic_df1() {
        // 60/40 split of 100 against 50/50: chi2 = 4.0, p ~ 0.0455
        let result = goodness_of_fit(&[60, 40], &ExpectedShape::Uniform).unwrap();
        assert!((result.statistic - 4.0).abs() < 1e-12);
        assert!((result.pvalue - 0.0455).abs() < 1e-3);
    }

    #[test]
    fn test_single_category_is_degenerate() {
        let err = goodness_of_fit(&[10], &ExpectedShape::Uniform).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_empty_table_is_degenerate() {
        let err = goodness_of_fit(&[0, 0], &ExpectedShape::Uniform).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_non_positive_expected_frequency() {
        let shape = ExpectedShape::Weights(vec![1.0, 0.0]);
        let err = goodness_of_fit(&[5, 5], &shape).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_point_mass_index_out_of_range() {
        let shape = ExpectedShape::PointMass {
            index: 4,
            weight: 10.0,
        };
        let err = goodness_of_fit(&[5, 5], &shape).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_independence_proportional_rows() {
        let table = vec![vec![10, 20, 30], vec![20, 40, 60]];
        let result = independence_test(&table, true).unwrap();
        assert_eq!(result.df, 2);
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn test_independence_strong_dependence() {
        let table = vec![vec![500, 0], vec![0, 500]];
        let result = independence_test(&table, false).unwrap();
        assert!((result.statistic - 1000.0).abs() < 1e-9);
        assert!(result.pvalue < 1e-10);
    }

    #[test]
    fn test_yates_correction_reduces_statistic() {
        let table = vec![vec![30, 20], vec![20, 30]];
        let plain = independence_test(&table, false).unwrap();
        let corrected = independence_test(&table, true).unwrap();
        // expected 25 everywhere: plain = 4 * 25/25 = 4.0, corrected = 4 * 20.25/25 = 3.24
        assert!((plain.statistic - 4.0).abs() < 1e-12);
        assert!((corrected.statistic - 3.24).abs() < 1e-12);
        assert!(corrected.pvalue > plain.pvalue);
    }

    #[test]
    fn test_independence_zero_row() {
        let table = vec![vec![1024, 0], vec![0, 0]];
        let err = independence_test(&table, true).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_independence_zero_column() {
        let table = vec![vec![10, 0], vec![5, 0]];
        let err = independence_test(&table, true).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_independence_too_small() {
        let err = independence_test(&[vec![3, 4]], true).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_independence_ragged() {
        let table = vec![vec![1, 2], vec![3]];
        let err = independence_test(&table, true).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_count_overflow_is_computation_error() {
        let err = goodness_of_fit(&[u64::MAX, 1], &ExpectedShape::Uniform).unwrap_err();
        assert!(err.is_computation());

        let table = vec![vec![u64::MAX, 1], vec![1, 1]];
        let err = independence_test(&table, false).unwrap_err();
        assert!(err.is_computation());

        // row and column sums fit, the grand total does not
        let table = vec![vec![u64::MAX / 2 + 1, 0], vec![0, u64::MAX / 2 + 1]];
        let err = independence_test(&table, false).unwrap_err();
        assert!(err.is_computation());
    }
}
