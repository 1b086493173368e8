//! Counters for the watch loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for event processing.
#[derive(Debug, Default)]
pub struct SyncStats {
    pub events_received: AtomicU64,
    pub events_ignored: AtomicU64,
    pub files_synced: AtomicU64,
    pub permission_denied: AtomicU64,
    pub errors: AtomicU64,
}

impl SyncStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            files_synced: self.files_synced.load(Ordering::Relaxed),
            permission_denied: self.permission_denied.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sync stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    pub events_received: u64,
    pub events_ignored: u64,
    pub files_synced: u64,
    pub permission_denied: u64,
    pub errors: u64,
}

impl SyncStatsSnapshot {
    /// Failures of any kind.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.permission_denied + self.errors
    }
}
