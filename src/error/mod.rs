//! Error types and Result aliases for dotsync.
//!
//! Startup failures (`Config`, `Baseline`, `Watcher`) are fatal.
//! Per-event failures live in [`SyncError`] and never stop the watch loop.

use thiserror::Error;

/// Result type alias using dotsync's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dotsync operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Initial mirror could not establish a baseline.
    #[error("baseline error: {0}")]
    Baseline(#[from] BaselineError),

    /// Single sync attempt failed.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while building the initial mirror.
#[derive(Error, Debug)]
pub enum BaselineError {
    /// Mirror root could not be created.
    #[error("failed to create mirror root '{path}': {reason}")]
    MirrorRoot { path: String, reason: String },

    /// A tracked directory could not be replaced in the mirror.
    #[error("failed to mirror directory '{path}' to '{destination}': {reason}")]
    DirectoryCopy {
        path: String,
        destination: String,
        reason: String,
    },
}

/// Recoverable failures for a single sync action.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The copy was denied by the filesystem.
    #[error("permission denied syncing '{path}' to '{destination}': {reason}")]
    PermissionDenied {
        path: String,
        destination: String,
        reason: String,
    },

    /// Any other I/O failure.
    #[error("could not sync '{path}' to '{destination}': {reason}")]
    Io {
        path: String,
        destination: String,
        reason: String,
    },

    /// The path is not under any tracked root.
    #[error("path '{path}' is not under a tracked root")]
    InvalidPath { path: String },
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Coordinator was driven out of order.
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the watch loop may continue after this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Sync(_))
    }
}

impl SyncError {
    /// Classify an I/O failure for a copy from `path` to `destination`.
    pub fn from_io(
        err: &std::io::Error,
        path: &std::path::Path,
        destination: &std::path::Path,
    ) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.display().to_string(),
                destination: destination.display().to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Io {
                path: path.display().to_string(),
                destination: destination.display().to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Create an invalid-path error.
    pub fn invalid_path(path: &std::path::Path) -> Self {
        Self::InvalidPath {
            path: path.display().to_string(),
        }
    }

    /// Check for a permission failure.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}
