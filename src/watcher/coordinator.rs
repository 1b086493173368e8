//! Drives the mirror from startup to shutdown.
//!
//! Lifecycle: `Idle -> Initializing -> Watching -> Draining -> Stopped`.
//! The baseline runs in `Initializing`; events are consumed only in
//! `Watching`, one at a time in arrival order. Each copy runs on the
//! blocking pool and is awaited before the next event is taken, so a slow
//! copy holds back the queue (and, once the channel fills, the notify thread).

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use super::events::SyncEvent;
use super::router::EventRouter;
use super::stats::SyncStats;
use super::watcher::FsWatcher;
use crate::config::DEFAULT_DRAIN_TIMEOUT;
use crate::error::{SyncError, WatcherError};
use crate::mirror::{
    run_baseline, BaselineReport, Copier, FsCopier, MirrorPlan, SyncAction, SyncExecutor,
};
use crate::observability::spans;
use crate::Result;

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Initializing,
    Watching,
    Draining,
    Stopped,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::Watching => "Watching",
            Self::Draining => "Draining",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Result of handling one event.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The action was applied.
    Synced { action: SyncAction, bytes: u64 },
    /// Nothing to do for this event.
    Ignored,
    /// The copy failed; the loop continues.
    Failed(SyncError),
}

/// Router, executor and counters shared with the blocking pool.
struct Dispatcher<C> {
    router: EventRouter,
    executor: SyncExecutor<C>,
    stats: Arc<SyncStats>,
}

impl<C: Copier> Dispatcher<C> {
    fn dispatch(&self, event: &SyncEvent) -> DispatchOutcome {
        let _span = spans::sync_span(&event.path).entered();
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);

        let Some(action) = self.router.route(event) else {
            self.stats.events_ignored.fetch_add(1, Ordering::Relaxed);
            return DispatchOutcome::Ignored;
        };

        match self.executor.execute(&action) {
            Ok(bytes) => {
                self.stats.files_synced.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    source = %action.source.display(),
                    destination = %action.destination.display(),
                    bytes,
                    "Synced file"
                );
                DispatchOutcome::Synced { action, bytes }
            }
            Err(e) => {
                if e.is_permission_denied() {
                    self.stats.permission_denied.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                }
                tracing::warn!(error = %e, "Sync failed");
                DispatchOutcome::Failed(e)
            }
        }
    }
}

/// Owns the mirror lifecycle: baseline, subscriptions, event loop, drain.
pub struct WatchCoordinator<C = FsCopier> {
    plan: Arc<MirrorPlan>,
    dispatcher: Arc<Dispatcher<C>>,
    state: RwLock<SyncState>,
    drain_timeout: Duration,
}

impl<C: Copier + 'static> WatchCoordinator<C> {
    /// Create a coordinator in the `Idle` state.
    #[must_use]
    pub fn new(plan: Arc<MirrorPlan>, copier: C) -> Self {
        let dispatcher = Dispatcher {
            router: EventRouter::new(Arc::clone(&plan)),
            executor: SyncExecutor::new(copier),
            stats: SyncStats::new(),
        };
        Self {
            plan,
            dispatcher: Arc::new(dispatcher),
            state: RwLock::new(SyncState::Idle),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Set how long shutdown waits for an in-flight copy.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Shared event counters.
    #[must_use]
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.dispatcher.stats)
    }

    /// Route and apply a single event.
    pub fn dispatch(&self, event: &SyncEvent) -> DispatchOutcome {
        self.dispatcher.dispatch(event)
    }

    /// Run the baseline mirror (`Idle -> Initializing`).
    ///
    /// A baseline failure moves the coordinator straight to `Stopped`.
    ///
    /// # Errors
    ///
    /// Returns an error if called out of order or the baseline fails.
    pub fn initialize(&self) -> Result<BaselineReport> {
        self.transition(SyncState::Idle, SyncState::Initializing)?;

        let _span = spans::baseline_span(self.plan.mirror_root()).entered();
        let result = run_baseline(&self.plan, self.dispatcher.executor.copier());
        if let Err(e) = &result {
            *self.state.write() = SyncState::Stopped;
            tracing::error!(error = %e, "Baseline failed");
        }
        result
    }

    /// Consume events until shutdown or until the channel closes.
    ///
    /// `subscriptions` is held for the lifetime of the loop and released
    /// after draining, before the coordinator reports `Stopped`.
    ///
    /// On shutdown an in-flight copy gets up to the drain timeout. A copy
    /// that outlives it cannot be aborted: it keeps running on the blocking
    /// pool, and dropping the runtime still waits for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the baseline has not run.
    pub async fn watch<R>(
        &self,
        events: &mut mpsc::Receiver<SyncEvent>,
        shutdown: &CancellationToken,
        subscriptions: R,
    ) -> Result<()> {
        self.transition(SyncState::Initializing, SyncState::Watching)?;
        tracing::info!(tracked = self.plan.len(), "Watching for changes");

        loop {
            let event = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => {
                        tracing::warn!("Event channel closed");
                        break;
                    }
                },
            };

            let dispatcher = Arc::clone(&self.dispatcher);
            let mut in_flight = tokio::task::spawn_blocking(move || dispatcher.dispatch(&event));

            tokio::select! {
                biased;
                joined = &mut in_flight => log_join(joined),
                () = shutdown.cancelled() => {
                    self.transition(SyncState::Watching, SyncState::Draining)?;
                    match tokio::time::timeout(self.drain_timeout, in_flight).await {
                        Ok(joined) => log_join(joined),
                        Err(_) => tracing::warn!(
                            timeout_ms = u64::try_from(self.drain_timeout.as_millis()).unwrap_or(u64::MAX),
                            "In-flight copy did not finish before drain timeout"
                        ),
                    }
                    break;
                }
            }
        }

        if self.state() == SyncState::Watching {
            self.transition(SyncState::Watching, SyncState::Draining)?;
        }

        drop(subscriptions);
        self.transition(SyncState::Draining, SyncState::Stopped)?;

        let snapshot = self.dispatcher.stats.snapshot();
        tracing::info!(
            received = snapshot.events_received,
            synced = snapshot.files_synced,
            ignored = snapshot.events_ignored,
            failed = snapshot.failures(),
            "Watch loop stopped"
        );
        Ok(())
    }

    /// Full lifecycle: baseline, subscribe, watch until `shutdown`.
    ///
    /// # Errors
    ///
    /// Returns an error if the baseline fails or a subscription cannot be made.
    pub async fn run(&self, channel_capacity: usize, shutdown: &CancellationToken) -> Result<()> {
        self.initialize()?;

        let (event_tx, mut event_rx) = mpsc::channel(channel_capacity);
        let watcher = match FsWatcher::for_plan(&self.plan, event_tx) {
            Ok(watcher) => watcher,
            Err(e) => {
                *self.state.write() = SyncState::Stopped;
                return Err(e);
            }
        };

        self.watch(&mut event_rx, shutdown, watcher).await
    }

    fn transition(&self, from: SyncState, to: SyncState) -> Result<()> {
        let mut state = self.state.write();
        if *state != from {
            return Err(WatcherError::InvalidTransition {
                from: state.to_string(),
                to: to.to_string(),
            }
            .into());
        }
        *state = to;
        tracing::debug!(%from, %to, "State transition");
        Ok(())
    }
}

fn log_join(joined: std::result::Result<DispatchOutcome, JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Dispatch task failed");
    }
}
