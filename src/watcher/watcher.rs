//! File system watcher using notify-rs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::events::SyncEvent;
use crate::error::WatcherError;
use crate::mirror::MirrorPlan;
use crate::Result;

/// One watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub path: PathBuf,
    pub recursive: bool,
}

impl Subscription {
    /// Whether events for `path` belong to this subscription.
    #[must_use]
    pub fn covers(&self, path: &Path) -> bool {
        if self.recursive {
            path.starts_with(&self.path)
        } else {
            path == self.path || path.parent() == Some(self.path.as_path())
        }
    }

    const fn mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }
}

/// Subscriptions needed to observe every tracked path.
///
/// One recursive subscription per tracked directory, plus one non-recursive
/// subscription per distinct parent of a tracked file. Parents already
/// covered by a recursive subscription are skipped.
#[must_use]
pub fn plan_subscriptions(plan: &MirrorPlan) -> Vec<Subscription> {
    let mut subscriptions: Vec<Subscription> = plan
        .dirs()
        .iter()
        .map(|dir| Subscription {
            path: dir.source_root.clone(),
            recursive: true,
        })
        .collect();

    for file in plan.files() {
        let Some(parent) = file.source.parent() else {
            continue;
        };
        if subscriptions
            .iter()
            .any(|s| s.path == parent || (s.recursive && parent.starts_with(&s.path)))
        {
            continue;
        }
        subscriptions.push(Subscription {
            path: parent.to_path_buf(),
            recursive: false,
        });
    }

    subscriptions
}

/// File system watcher that forwards [`SyncEvent`]s into a channel.
///
/// The notify backend calls back on its own thread; events cross to the
/// async side through a bounded channel. A full channel blocks that thread.
pub struct FsWatcher {
    watcher: RecommendedWatcher,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

impl FsWatcher {
    /// Create a watcher with no subscriptions.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be created.
    pub fn new(event_tx: mpsc::Sender<SyncEvent>) -> Result<Self> {
        let subscriptions: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let subscriptions_clone = Arc::clone(&subscriptions);

        let watcher = notify::recommended_watcher(
            move |result: std::result::Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    let events = SyncEvent::from_notify(&event);
                    let subs = subscriptions_clone.lock().clone();
                    for sync_event in events {
                        if !subs.iter().any(|s| s.covers(&sync_event.path)) {
                            continue;
                        }
                        if event_tx.blocking_send(sync_event).is_err() {
                            tracing::debug!("Event channel closed, dropping event");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: "init".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            watcher,
            subscriptions,
        })
    }

    /// Create a watcher subscribed to everything `plan` tracks.
    ///
    /// # Errors
    ///
    /// Returns an error if any subscription fails.
    pub fn for_plan(plan: &MirrorPlan, event_tx: mpsc::Sender<SyncEvent>) -> Result<Self> {
        let mut watcher = Self::new(event_tx)?;
        for subscription in plan_subscriptions(plan) {
            watcher.subscribe(subscription)?;
        }
        Ok(watcher)
    }

    /// Start watching a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be watched.
    pub fn subscribe(&mut self, subscription: Subscription) -> Result<()> {
        if !subscription.path.exists() {
            return Err(WatcherError::WatchFailed {
                path: subscription.path.display().to_string(),
                reason: "path does not exist".to_string(),
            }
            .into());
        }

        // Register first so no early event is filtered out.
        self.subscriptions.lock().push(subscription.clone());

        if let Err(e) = self.watcher.watch(&subscription.path, subscription.mode()) {
            self.subscriptions.lock().retain(|s| s != &subscription);
            return Err(WatcherError::WatchFailed {
                path: subscription.path.display().to_string(),
                reason: e.to_string(),
            }
            .into());
        }

        tracing::info!(
            path = %subscription.path.display(),
            recursive = subscription.recursive,
            "Watching path"
        );
        Ok(())
    }

    /// Current subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().clone()
    }
}

impl Drop for FsWatcher {
    fn drop(&mut self) {
        let count = self.subscriptions.lock().len();
        tracing::debug!(subscriptions = count, "Releasing watch subscriptions");
    }
}
