//! The resolved, validated set of tracked paths.
//!
//! A [`MirrorPlan`] is built once at startup and never mutated afterwards.
//! The router, executor, and baseline all borrow it (usually via `Arc`).

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use super::mapper::{DirEntry, FileEntry};
use crate::error::SyncError;
use crate::{Error, Result};

/// Tracked files and directories with their mirror destinations.
#[derive(Debug, Clone)]
pub struct MirrorPlan {
    mirror_root: PathBuf,
    files: Vec<FileEntry>,
    file_index: HashMap<PathBuf, usize>,
    dirs: Vec<DirEntry>,
}

impl MirrorPlan {
    /// Resolve configured paths against the filesystem and validate the result.
    ///
    /// Each tracked path is canonicalized and classified as a file or a
    /// directory. Configured order is preserved.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a tracked path does not exist, is
    /// listed twice, or the resulting plan fails validation.
    pub fn build(mirror_root: &Path, tracked: &[PathBuf]) -> Result<Self> {
        let mirror_root = absolute_mirror_root(mirror_root)?;
        let mut files = Vec::new();
        let mut dirs = Vec::new();

        for configured in tracked {
            let source = configured.canonicalize().map_err(|e| {
                Error::config(format!(
                    "tracked path '{}' is not accessible: {e}",
                    configured.display()
                ))
            })?;

            if source.is_dir() {
                dirs.push(source);
            } else {
                files.push(source);
            }
        }

        Self::new(mirror_root, files, dirs)
    }

    /// Create a plan from already-resolved absolute paths.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if nothing is tracked, on duplicates,
    /// overlapping directory roots, destination collisions, or a mirror root
    /// that would feed back into a tracked path.
    pub fn new(mirror_root: PathBuf, files: Vec<PathBuf>, dirs: Vec<PathBuf>) -> Result<Self> {
        let mut seen = HashSet::new();
        for path in files.iter().chain(&dirs) {
            if !seen.insert(path) {
                return Err(Error::config(format!(
                    "tracked path '{}' is listed more than once",
                    path.display()
                )));
            }
        }

        let files: Vec<FileEntry> = files
            .into_iter()
            .map(|source| FileEntry::new(&mirror_root, source))
            .collect();
        let dirs: Vec<DirEntry> = dirs
            .into_iter()
            .map(|source| DirEntry::new(&mirror_root, source))
            .collect();
        let file_index = files
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.source.clone(), i))
            .collect();

        let plan = Self {
            mirror_root,
            files,
            file_index,
            dirs,
        };
        if plan.is_empty() {
            return Err(Error::config("no tracked paths"));
        }
        plan.check_overlapping_dirs()?;
        plan.check_destinations()?;
        plan.check_mirror_root()?;
        Ok(plan)
    }

    /// Root of the mirror tree.
    #[must_use]
    pub fn mirror_root(&self) -> &Path {
        &self.mirror_root
    }

    /// Tracked files, in configured order.
    #[must_use]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Tracked directory roots, in configured order.
    #[must_use]
    pub fn dirs(&self) -> &[DirEntry] {
        &self.dirs
    }

    /// Destination of an exactly tracked file.
    #[must_use]
    pub fn file_destination(&self, source: &Path) -> Option<&Path> {
        self.file_index
            .get(source)
            .map(|&i| self.files[i].destination.as_path())
    }

    /// First directory root that strictly contains `path`.
    #[must_use]
    pub fn dir_containing(&self, path: &Path) -> Option<&DirEntry> {
        self.dirs.iter().find(|dir| dir.contains(path))
    }

    /// Map a path nested under a tracked directory to its destination.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPath`] if no tracked directory contains `path`.
    pub fn resolve_nested(&self, path: &Path) -> std::result::Result<PathBuf, SyncError> {
        self.dir_containing(path)
            .ok_or_else(|| SyncError::invalid_path(path))?
            .resolve(path)
    }

    /// Total number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len() + self.dirs.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    fn check_overlapping_dirs(&self) -> Result<()> {
        for (i, a) in self.dirs.iter().enumerate() {
            for b in &self.dirs[i + 1..] {
                if a.source_root.starts_with(&b.source_root)
                    || b.source_root.starts_with(&a.source_root)
                {
                    return Err(Error::config(format!(
                        "tracked directories '{}' and '{}' overlap",
                        a.source_root.display(),
                        b.source_root.display()
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_destinations(&self) -> Result<()> {
        let entries: Vec<(&Path, &Path)> = self
            .files
            .iter()
            .map(|f| (f.source.as_path(), f.destination.as_path()))
            .chain(
                self.dirs
                    .iter()
                    .map(|d| (d.source_root.as_path(), d.destination_root.as_path())),
            )
            .collect();

        let mut claimed: HashMap<&Path, &Path> = HashMap::new();
        for &(source, destination) in &entries {
            if let Some(other) = claimed.insert(destination, source) {
                return Err(collision(other, source, destination));
            }
        }

        // A destination inside a directory's mirror must come from inside that directory.
        for dir in &self.dirs {
            for &(source, destination) in &entries {
                if source != dir.source_root.as_path()
                    && destination.starts_with(&dir.destination_root)
                    && !source.starts_with(&dir.source_root)
                {
                    return Err(collision(&dir.source_root, source, destination));
                }
            }
        }
        Ok(())
    }

    fn check_mirror_root(&self) -> Result<()> {
        for dir in &self.dirs {
            if self.mirror_root.starts_with(&dir.source_root) {
                return Err(Error::config(format!(
                    "mirror root '{}' is inside tracked directory '{}'",
                    self.mirror_root.display(),
                    dir.source_root.display()
                )));
            }
        }
        for source in self
            .files
            .iter()
            .map(|f| &f.source)
            .chain(self.dirs.iter().map(|d| &d.source_root))
        {
            if source.starts_with(&self.mirror_root) {
                return Err(Error::config(format!(
                    "tracked path '{}' is inside the mirror root '{}'",
                    source.display(),
                    self.mirror_root.display()
                )));
            }
        }
        Ok(())
    }
}

fn collision(a: &Path, b: &Path, destination: &Path) -> Error {
    Error::config(format!(
        "tracked paths '{}' and '{}' both map to '{}'",
        a.display(),
        b.display(),
        destination.display()
    ))
}

/// Make the mirror root absolute, resolving symlinks in its existing ancestors.
///
/// `..` is applied after the prefix before it has been resolved, so it always
/// names the real parent. Components past the last existing one are joined
/// lexically.
fn absolute_mirror_root(root: &Path) -> Result<PathBuf> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other);
                if let Ok(canonical) = resolved.canonicalize() {
                    resolved = canonical;
                }
            }
        }
    }
    Ok(resolved)
}
