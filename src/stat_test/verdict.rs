// Pass/fail decision for a chi-square test
//
// The decision depends on which outcome of the test an assertion treats as
// success. Consistency claims (superposition, classical value) pass when the
// null hypothesis is not rejected; the product claim passes when
// independence IS rejected. `negate` flips either rule.

use crate::stat_test::statistics::ChiSquareTest;
use serde::{Deserialize, Serialize};

/// Which side of the threshold counts as a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// p > pcrit passes
    FailToReject,

    /// p <= pcrit passes
    Reject,
}

impl Polarity {
    /// Apply the decision rule
    ///
    /// ```
    /// use qbreak::stat_test::Polarity;
    ///
    /// assert!(Polarity::FailToReject.decide(0.9, 0.05, false));
    /// assert!(!Polarity::FailToReject.decide(0.9, 0.05, true));
    /// assert!(Polarity::Reject.decide(0.05, 0.05, false));
    /// ```
    pub fn decide(self, pvalue: f64, pcrit: f64, negate: bool) -> bool {
        let holds = match self {
            Polarity::FailToReject => pvalue > pcrit,
            Polarity::Reject => pvalue <= pcrit,
        };
        holds != negate
    }
}

/// Outcome of evaluating one assertion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatResult {
    /// Chi-square statistic
    pub statistic: f64,

    /// p-value in [0, 1]
    pub p_value: f64,

    /// Did the assertion pass?
    pub passed: bool,
}

impl StatResult {
    pub fn from_test(test: &ChiSquareTest, polarity: Polarity, pcrit: f64, negate: bool) -> Self {
        Self {
            statistic: test.statistic,
            p_value: test.pvalue,
            passed: polarity.decide(test.pvalue, pcrit, negate),
        }
    }

    /// `(statistic, p_value, passed)`
    pub fn triple(&self) -> (f64, f64, bool) {
        (self.statistic, self.p_value, self.passed)
    }
}
