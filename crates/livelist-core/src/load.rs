//! Initial-load completion tracking.

use std::collections::HashSet;

/// Staged-loading state for one session.
///
/// Completion is the AND of two independently-set conditions: the ordering
/// stream has delivered its initial batch, and every key from that batch has
/// resolved its first value. The transition to complete happens at most once
/// per session; only [`reset`](LoadState::reset) rearms it.
#[derive(Debug, Default)]
pub struct LoadState {
    ordering_loaded: bool,
    outstanding: HashSet<String>,
    complete: bool,
}

impl LoadState {
    /// Create a fresh, unloaded state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the initial load has completed.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the ordering stream's initial batch has been delivered.
    pub fn ordering_loaded(&self) -> bool {
        self.ordering_loaded
    }

    /// Track `key` as part of the initial batch. Ignored once the ordering
    /// stream has loaded; keys announced after that point do not gate
    /// completion.
    pub fn track(&mut self, key: &str) {
        if !self.ordering_loaded {
            self.outstanding.insert(key.to_string());
        }
    }

    /// Mark the ordering stream's initial batch as delivered. Returns
    /// whether this completed the load.
    pub fn mark_ordering_loaded(&mut self) -> bool {
        self.ordering_loaded = true;
        self.reevaluate()
    }

    /// Resolve `key`: its first value arrived, or it was removed before
    /// promotion. Returns whether this completed the load.
    pub fn resolve(&mut self, key: &str) -> bool {
        self.outstanding.remove(key);
        self.reevaluate()
    }

    /// Return to the unloaded state.
    pub fn reset(&mut self) {
        self.ordering_loaded = false;
        self.outstanding.clear();
        self.complete = false;
    }

    fn reevaluate(&mut self) -> bool {
        if self.complete {
            return false;
        }
        if self.ordering_loaded && self.outstanding.is_empty() {
            self.complete = true;
            return true;
        }
        false
    }
}
