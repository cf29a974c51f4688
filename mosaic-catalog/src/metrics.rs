//! Merge activity counters.
//!
//! Plain atomics, readable at any time without touching the merge lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for merge activity since startup.
#[derive(Debug, Default)]
pub struct MergeMetrics {
    /// Merge executions started (background and priority).
    pub merges_started: AtomicU64,

    /// Merge executions that published a snapshot.
    pub merges_succeeded: AtomicU64,

    /// Merge executions that failed; the cache was left untouched.
    pub merges_failed: AtomicU64,

    /// Upstream rows dropped for a missing or empty product code.
    pub rows_skipped_missing_code: AtomicU64,

    /// Record count of the most recently published snapshot.
    pub last_snapshot_records: AtomicU64,

    /// Wall-clock duration of the most recent successful merge.
    pub last_merge_duration_ms: AtomicU64,
}

impl MergeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> MergeMetricsSnapshot {
        MergeMetricsSnapshot {
            merges_started: self.merges_started.load(Ordering::Relaxed),
            merges_succeeded: self.merges_succeeded.load(Ordering::Relaxed),
            merges_failed: self.merges_failed.load(Ordering::Relaxed),
            rows_skipped_missing_code: self.rows_skipped_missing_code.load(Ordering::Relaxed),
            last_snapshot_records: self.last_snapshot_records.load(Ordering::Relaxed),
            last_merge_duration_ms: self.last_merge_duration_ms.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`MergeMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeMetricsSnapshot {
    pub merges_started: u64,
    pub merges_succeeded: u64,
    pub merges_failed: u64,
    pub rows_skipped_missing_code: u64,
    pub last_snapshot_records: u64,
    pub last_merge_duration_ms: u64,
}
