//! Breakpoint identities from monotonic counters
//!
//! An identity is `breakpoint_<kind>_r<run>_<seq>`:
//! - `run` is drawn once per [`IdGenerator`] from a process-wide counter, so
//!   two generators in the same process never hand out the same name
//! - `seq` increments on every identity a generator produces
//!
//! No clock is involved. Tests pin the run number with
//! [`IdGenerator::with_run`] and get fully deterministic names.
//!
//! # Example
//!
//! ```
//! use qbreak::breakpoint_id::IdGenerator;
//!
//! let ids = IdGenerator::with_run(7);
//! assert_eq!(ids.next_id("classical").as_str(), "breakpoint_classical_r7_0");
//! assert_eq!(ids.next_id("product").as_str(), "breakpoint_product_r7_1");
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identity of a breakpoint program, unique within a process
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointId(String);

impl BreakpointId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BreakpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BreakpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BreakpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Monotonic identity source for one run
///
/// Thread-safe: the sequence counter is a single atomic, like a Lamport
/// clock's local tick.
#[derive(Debug)]
pub struct IdGenerator {
    run: u64,
    counter: AtomicU64,
}

impl IdGenerator {
    /// Generator with the next process-wide run number
    pub fn new() -> Self {
        Self::with_run(RUN_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Generator with a caller-chosen run number
    pub const fn with_run(run: u64) -> Self {
        Self {
            run,
            counter: AtomicU64::new(0),
        }
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Advance the sequence; returns the value before the increment
    pub fn tick(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of identities handed out so far
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn next_id(&self, kind: &str) -> BreakpointId {
        BreakpointId(format!("breakpoint_{}_r{}_{}", kind, self.run, self.tick()))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_is_monotonic() {
        let ids = IdGenerator::with_run(0);
        assert_eq!(ids.tick(), 0);
        assert_eq!(ids.tick(), 1);
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_generators_get_distinct_runs() {
        let a = IdGenerator::new();
        let b = IdGenerator::new();
        assert_ne!(a.run(), b.run());
        assert_ne!(a.next_id("superposition"), b.next_id("superposition"));
    }

    #[test]
    fn test_concurrent_ids_are_unique() {
        let ids = Arc::new(IdGenerator::with_run(3));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..100).map(|_| ids.next_id("x")).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 400);
    }

    #[test]
    fn test_display_and_borrow() {
        let id = IdGenerator::with_run(1).next_id("product");
        assert_eq!(id.to_string(), "breakpoint_product_r1_0");
        let borrowed: &str = id.borrow();
        assert_eq!(borrowed, id.as_str());
    }
}
