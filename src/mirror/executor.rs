//! Applies resolved sync actions to the mirror.

use std::fs;
use std::path::PathBuf;

use super::copy::{Copier, FsCopier};
use crate::error::SyncError;

/// A resolved source/destination pair, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl SyncAction {
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Copies a single action's source to its destination.
///
/// Copies are idempotent: repeating an action over an unchanged source
/// leaves the destination byte-identical.
#[derive(Debug, Default)]
pub struct SyncExecutor<C = FsCopier> {
    copier: C,
}

impl<C: Copier> SyncExecutor<C> {
    /// Create an executor over the given copier.
    pub const fn new(copier: C) -> Self {
        Self { copier }
    }

    /// The underlying copier.
    pub const fn copier(&self) -> &C {
        &self.copier
    }

    /// Ensure the destination's parent exists, then copy.
    ///
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PermissionDenied`] or [`SyncError::Io`]; both are
    /// recoverable and leave the executor usable for later actions.
    pub fn execute(&self, action: &SyncAction) -> Result<u64, SyncError> {
        if let Some(parent) = action.destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SyncError::from_io(&e, &action.source, &action.destination))?;
        }

        self.copier
            .copy_file(&action.source, &action.destination)
            .map_err(|e| SyncError::from_io(&e, &action.source, &action.destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_execute_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("theme.conf");
        fs::write(&src, "[Theme]\n").unwrap();
        let dst = tmp.path().join("mirror/usr/share/sddm/themes/foo/theme.conf");

        let executor = SyncExecutor::new(FsCopier);
        let bytes = executor.execute(&SyncAction::new(&src, &dst)).unwrap();

        assert_eq!(bytes, 8);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "[Theme]\n");
    }

    #[test]
    fn test_execute_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("rc");
        fs::write(&src, "export EDITOR=nvim\n").unwrap();
        let dst = tmp.path().join("out/rc");
        let action = SyncAction::new(&src, &dst);
        let executor = SyncExecutor::new(FsCopier);

        executor.execute(&action).unwrap();
        let first = fs::read(&dst).unwrap();
        let first_mtime = fs::metadata(&dst).unwrap().modified().unwrap();

        executor.execute(&action).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), first);
        assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), first_mtime);
    }

    #[test]
    fn test_execute_missing_source_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let executor = SyncExecutor::new(FsCopier);

        let err = executor
            .execute(&SyncAction::new(
                tmp.path().join("vanished"),
                tmp.path().join("out/vanished"),
            ))
            .unwrap_err();

        assert!(matches!(err, SyncError::Io { .. }));
        assert!(err.to_string().contains("vanished"));
    }
}
