//! Pipeline throughput counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for pipeline activity.
///
/// All counters use relaxed ordering; they are monotonically increasing
/// tallies, not synchronization points.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    submitted: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
    write_failures: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the running drop total so callers can rate-limit alerts.
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Fraction of submitted events that were dropped, 0.0 when idle
    pub fn drop_rate(&self) -> f64 {
        let submitted = self.submitted();
        if submitted == 0 {
            return 0.0;
        }
        self.dropped() as f64 / submitted as f64
    }

    pub fn reset(&self) {
        self.submitted.store(0, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
    }

    /// Point-in-time copy for reporting
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted(),
            processed: self.processed(),
            dropped: self.dropped(),
            write_failures: self.write_failures(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub processed: u64,
    pub dropped: u64,
    pub write_failures: u64,
}
