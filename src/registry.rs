use crate::assertion::Assertion;
use crate::breakpoint_id::BreakpointId;
use crate::error::{BreakpointError, Result};
use std::collections::BTreeMap;

/// Append-only record of the assertion behind every breakpoint of a run
///
/// Written once per breakpoint at insertion time, read at collection time.
/// Entries are never updated or removed; a second registration under the
/// same identity is rejected. One registry belongs to one
/// [`RunContext`](crate::collector::RunContext), so separate runs never see
/// each other's entries.
#[derive(Debug, Default, Clone)]
pub struct RunRegistry {
    entries: BTreeMap<BreakpointId, Assertion>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `assertion` under `id`
    ///
    /// # Errors
    /// `Configuration` if `id` is already registered.
    pub fn register(&mut self, id: BreakpointId, assertion: Assertion) -> Result<()> {
        if self.entries.contains_key(&id) {
            return Err(BreakpointError::config(format!(
                "breakpoint '{}' is already registered",
                id
            )));
        }
        self.entries.insert(id, assertion);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Assertion> {
        self.entries.get(id)
    }

    /// Like [`get`](Self::get), but a missing entry is a `NotFound` error
    pub fn lookup(&self, id: &str) -> Result<&Assertion> {
        self.get(id).ok_or_else(|| {
            BreakpointError::NotFound(format!("{} (no registry entry in this run)", id))
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in identity order
    pub fn iter(&self) -> impl Iterator<Item = (&BreakpointId, &Assertion)> {
        self.entries.iter()
    }
}
