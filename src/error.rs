//! Error kinds for breakpoint construction, evaluation and collection
//!
//! Configuration problems surface when an assertion or breakpoint is built,
//! never later. Computation problems come out of the test engine when a
//! frequency table cannot support a chi-square test. Missing execution
//! output is reported per breakpoint at collection time.

use thiserror::Error;

/// Errors raised by the statistical breakpoint subsystem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BreakpointError {
    /// Invalid target bits, out-of-range index, bad pcrit, malformed labels
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Degenerate frequency or contingency table
    #[error("Computation error: {0}")]
    Computation(String),

    /// No frequency table (or no registry entry) for a breakpoint
    #[error("Breakpoint not found: {0}")]
    NotFound(String),
}

impl BreakpointError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn computation(message: impl Into<String>) -> Self {
        Self::Computation(message.into())
    }

    /// Tag the error with the breakpoint it was raised for
    ///
    /// The kind is preserved; only the message gains the identity prefix.
    pub fn for_breakpoint(self, id: &str) -> Self {
        match self {
            Self::Configuration(msg) => Self::Configuration(format!("{}: {}", id, msg)),
            Self::Computation(msg) => Self::Computation(format!("{}: {}", id, msg)),
            Self::NotFound(msg) => Self::NotFound(msg),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_computation(&self) -> bool {
        matches!(self, Self::Computation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BreakpointError>;
