//! File system event types and conversion from notify.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::EventKind;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Path was created.
    Created,
    /// Contents or metadata changed.
    Modified,
    /// Path was renamed into place.
    Renamed,
}

/// A single change notification, consumed once by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    pub path: PathBuf,
    pub is_dir: bool,
    pub kind: ChangeKind,
}

impl SyncEvent {
    /// Event for a file.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            kind,
        }
    }

    /// Event for a directory.
    #[must_use]
    pub fn dir(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            kind,
        }
    }

    /// Convert a raw notify event.
    ///
    /// Removals and access events yield nothing. For renames only the
    /// destination path is kept.
    #[must_use]
    pub fn from_notify(event: &notify::Event) -> Vec<Self> {
        match event.kind {
            EventKind::Create(CreateKind::Folder) => event
                .paths
                .iter()
                .map(|p| Self::dir(p, ChangeKind::Created))
                .collect(),
            EventKind::Create(CreateKind::File) => event
                .paths
                .iter()
                .map(|p| Self::file(p, ChangeKind::Created))
                .collect(),
            EventKind::Create(_) => event
                .paths
                .iter()
                .map(|p| Self::probe(p, ChangeKind::Created))
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both)) => event
                .paths
                .last()
                .map(|p| Self::probe(p, ChangeKind::Renamed))
                .into_iter()
                .collect(),
            // Backends that cannot tell source from target report both sides.
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => event
                .paths
                .iter()
                .filter(|p| p.exists())
                .map(|p| Self::probe(p, ChangeKind::Renamed))
                .collect(),
            EventKind::Modify(ModifyKind::Name(_)) => Vec::new(),
            EventKind::Modify(_) => event
                .paths
                .iter()
                .map(|p| Self::probe(p, ChangeKind::Modified))
                .collect(),
            EventKind::Access(_) | EventKind::Remove(_) | EventKind::Any | EventKind::Other => {
                Vec::new()
            }
        }
    }

    /// Build an event, asking the filesystem whether the path is a directory.
    fn probe(path: &Path, kind: ChangeKind) -> Self {
        Self {
            path: path.to_path_buf(),
            is_dir: path.is_dir(),
            kind,
        }
    }
}
