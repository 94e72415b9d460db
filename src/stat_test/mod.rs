// Chi-square Test Engine for statistical breakpoints
//
// A breakpoint does not compare an observed outcome for equality. It asks
// whether the histogram of outcomes collected at that point is consistent
// with a claimed distribution, and answers with a hypothesis test.
//
// Two tests cover every assertion variant:
// - Pearson goodness-of-fit against an expected shape (uniform or point mass)
// - Pearson test of independence over a two-way contingency table
//
// Both are pure functions of their input tables. The pass/fail decision is
// kept separate (verdict.rs) because each assertion variant declares its own
// polarity: some pass when the null hypothesis survives, some when it is
// rejected.
//
// Implementation:
// - statrs supplies the chi-square survival function for p-values
// - EngineConfig carries the knobs (continuity correction, point-mass weight)

mod config;
mod statistics;
mod verdict;

pub use config::EngineConfig;
pub(crate) use config::validate_pcrit;
pub use statistics::{goodness_of_fit, independence_test, ChiSquareTest, ExpectedShape};
pub use verdict::{Polarity, StatResult};
