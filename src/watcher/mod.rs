//! File system watching and event routing.
//!
//! This module provides:
//! - Conversion of notify events into [`SyncEvent`]s
//! - Routing of events to sync actions
//! - Subscriptions covering every tracked path
//! - The coordinator that runs the baseline and the event loop

mod coordinator;
mod events;
mod router;
mod stats;
#[allow(clippy::module_inception)]
mod watcher;

pub use coordinator::{DispatchOutcome, SyncState, WatchCoordinator};
pub use events::{ChangeKind, SyncEvent};
pub use router::{EventRouter, Route};
pub use stats::{SyncStats, SyncStatsSnapshot};
pub use watcher::{plan_subscriptions, FsWatcher, Subscription};
