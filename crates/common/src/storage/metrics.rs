//! Storage metrics tracking
//!
//! Atomic counters for handle opens and statement outcomes. Cheap enough to
//! update on every call and readable from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`StorageMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful handle opens
    pub opens: u64,
    /// Failed handle opens
    pub open_failures: u64,
    /// Statements that completed
    pub queries_executed: u64,
    /// Statements that failed
    pub queries_failed: u64,
}

/// Simple storage metrics tracker
#[derive(Debug, Default)]
pub struct StorageMetrics {
    opens: AtomicU64,
    open_failures: AtomicU64,
    queries_executed: AtomicU64,
    queries_failed: AtomicU64,
}

impl StorageMetrics {
    /// Create a new metrics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful open
    pub fn record_open(&self) {
        self.opens.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed open
    pub fn record_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful query execution
    pub fn record_query_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed query
    pub fn record_query_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            opens: self.opens.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
        }
    }
}
