//! Run-level failure statistics.
//!
//! Thread-safe counters per failure category, shared across probe tasks
//! and summarized after the run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::IntoEnumIterator;

use super::classify::FailureKind;

/// Counts probe failures by category over one run.
///
/// All categories are initialized to zero on creation, so `record` never
/// needs to insert.
#[derive(Debug)]
pub struct FailureStats {
    counters: HashMap<FailureKind, AtomicUsize>,
}

impl FailureStats {
    /// Creates a tracker with every failure category zeroed.
    pub fn new() -> Self {
        let mut counters = HashMap::new();
        for kind in FailureKind::iter() {
            counters.insert(kind, AtomicUsize::new(0));
        }
        FailureStats { counters }
    }

    /// Increments the counter for a failure category.
    pub fn record(&self, kind: FailureKind) {
        if let Some(counter) = self.counters.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current count for a category.
    pub fn count(&self, kind: FailureKind) -> usize {
        self.counters
            .get(&kind)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Total failures across all categories.
    pub fn total(&self) -> usize {
        self.counters
            .values()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Logs non-zero counters, one line per category.
    pub fn log_summary(&self) {
        if self.total() == 0 {
            return;
        }
        log::info!("Probe failures this run:");
        for kind in FailureKind::iter() {
            let count = self.count(kind);
            if count > 0 {
                log::info!("  {}: {}", kind.as_str(), count);
            }
        }
    }
}

impl Default for FailureStats {
    fn default() -> Self {
        Self::new()
    }
}
