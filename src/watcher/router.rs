//! Classifies change events against the tracked paths.

use std::sync::Arc;

use super::events::SyncEvent;
use crate::mirror::{MirrorPlan, SyncAction};

/// Why an event was or was not routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Exact match on a tracked file.
    File(SyncAction),
    /// Nested under a tracked directory.
    Directory(SyncAction),
    /// Directory-level change; only files are mirrored.
    DirectoryChange,
    /// Not tracked.
    Irrelevant,
}

impl Route {
    /// The action to execute, if any.
    #[must_use]
    pub fn into_action(self) -> Option<SyncAction> {
        match self {
            Self::File(action) | Self::Directory(action) => Some(action),
            Self::DirectoryChange | Self::Irrelevant => None,
        }
    }
}

/// Routes events to sync actions using an immutable [`MirrorPlan`].
#[derive(Debug, Clone)]
pub struct EventRouter {
    plan: Arc<MirrorPlan>,
}

impl EventRouter {
    #[must_use]
    pub fn new(plan: Arc<MirrorPlan>) -> Self {
        Self { plan }
    }

    /// Classify one event.
    ///
    /// Tracked files win over tracked directories; among directories the
    /// first registered root that contains the path is used.
    #[must_use]
    pub fn classify(&self, event: &SyncEvent) -> Route {
        if event.is_dir {
            return Route::DirectoryChange;
        }

        if let Some(destination) = self.plan.file_destination(&event.path) {
            return Route::File(SyncAction::new(&event.path, destination));
        }

        match self.plan.resolve_nested(&event.path) {
            Ok(destination) => Route::Directory(SyncAction::new(&event.path, destination)),
            Err(e) => {
                tracing::trace!(error = %e, "Dropping untracked event");
                Route::Irrelevant
            }
        }
    }

    /// Resolve an event to the action to perform, if any.
    #[must_use]
    pub fn route(&self, event: &SyncEvent) -> Option<SyncAction> {
        self.classify(event).into_action()
    }
}
