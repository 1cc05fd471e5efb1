//! Process-wide counters for the assignment engine.
//!
//! Counters are bumped at the call site and read back by [`Metrics::flush`],
//! which emits them as one `info!` event (the daemon does this on shutdown).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Relaxed atomic counters.
pub struct Metrics {
    pull_requests_created: AtomicU64,
    pull_requests_merged: AtomicU64,
    reassignments: AtomicU64,
    assignment_write_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub pull_requests_created: u64,
    pub pull_requests_merged: u64,
    pub reassignments: u64,
    pub assignment_write_failures: u64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            pull_requests_created: AtomicU64::new(0),
            pull_requests_merged: AtomicU64::new(0),
            reassignments: AtomicU64::new(0),
            assignment_write_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_pull_requests_created(&self) {
        self.pull_requests_created.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "pull_requests_created", "counter incremented");
    }

    pub fn inc_pull_requests_merged(&self) {
        self.pull_requests_merged.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "pull_requests_merged", "counter incremented");
    }

    pub fn inc_reassignments(&self) {
        self.reassignments.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "reassignments", "counter incremented");
    }

    /// A best-effort reviewer edge could not be recorded.
    pub fn inc_assignment_write_failures(&self) {
        self.assignment_write_failures
            .fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "assignment_write_failures", "counter incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pull_requests_created: self.pull_requests_created.load(Ordering::Relaxed),
            pull_requests_merged: self.pull_requests_merged.load(Ordering::Relaxed),
            reassignments: self.reassignments.load(Ordering::Relaxed),
            assignment_write_failures: self.assignment_write_failures.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        let snap = self.snapshot();
        tracing::info!(
            metric = "flush",
            pull_requests_created = snap.pull_requests_created,
            pull_requests_merged = snap.pull_requests_merged,
            reassignments = snap.reassignments,
            assignment_write_failures = snap.assignment_write_failures,
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.pull_requests_created.store(0, Ordering::Relaxed);
        self.pull_requests_merged.store(0, Ordering::Relaxed);
        self.reassignments.store(0, Ordering::Relaxed);
        self.assignment_write_failures.store(0, Ordering::Relaxed);
    }
}
