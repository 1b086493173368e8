//! Source-to-mirror path mapping.

use std::path::{Component, Path, PathBuf};

use crate::error::SyncError;

/// Remove the filesystem root (and any drive prefix) from a path.
#[must_use]
pub fn strip_anchor(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

/// Destination of a tracked path under `mirror_root`.
#[must_use]
pub fn mirror_destination(mirror_root: &Path, source: &Path) -> PathBuf {
    mirror_root.join(strip_anchor(source))
}

/// A single tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl FileEntry {
    #[must_use]
    pub fn new(mirror_root: &Path, source: PathBuf) -> Self {
        let destination = mirror_destination(mirror_root, &source);
        Self {
            source,
            destination,
        }
    }
}

/// A tracked directory root. Nested paths are mapped at event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
}

impl DirEntry {
    #[must_use]
    pub fn new(mirror_root: &Path, source_root: PathBuf) -> Self {
        let destination_root = mirror_destination(mirror_root, &source_root);
        Self {
            source_root,
            destination_root,
        }
    }

    /// Whether `path` lies strictly below this root (component-wise).
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        path != self.source_root && path.starts_with(&self.source_root)
    }

    /// Map a path below the source root to its mirror destination.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPath`] if `path` is not strictly below the root.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, SyncError> {
        match path.strip_prefix(&self.source_root) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                Ok(self.destination_root.join(relative))
            }
            _ => Err(SyncError::invalid_path(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_anchor() {
        assert_eq!(
            strip_anchor(Path::new("/home/u/.bashrc")),
            PathBuf::from("home/u/.bashrc")
        );
        assert_eq!(strip_anchor(Path::new("/")), PathBuf::new());
        assert_eq!(
            strip_anchor(Path::new("relative/path")),
            PathBuf::from("relative/path")
        );
    }

    #[test]
    fn test_bashrc_scenario() {
        let entry = FileEntry::new(
            Path::new("/home/u/Repos/dotfiles"),
            PathBuf::from("/home/u/.bashrc"),
        );
        assert_eq!(
            entry.destination,
            PathBuf::from("/home/u/Repos/dotfiles/home/u/.bashrc")
        );
    }

    #[test]
    fn test_dir_entry_resolve_nested() {
        let entry = DirEntry::new(
            Path::new("/mirror"),
            PathBuf::from("/usr/share/sddm/themes"),
        );
        assert_eq!(
            entry.destination_root,
            PathBuf::from("/mirror/usr/share/sddm/themes")
        );
        assert_eq!(
            entry
                .resolve(Path::new("/usr/share/sddm/themes/foo/theme.conf"))
                .unwrap(),
            PathBuf::from("/mirror/usr/share/sddm/themes/foo/theme.conf")
        );
    }

    #[test]
    fn test_dir_entry_resolve_outside_root() {
        let entry = DirEntry::new(Path::new("/mirror"), PathBuf::from("/etc/nixos"));
        let err = entry.resolve(Path::new("/etc/hosts")).unwrap_err();
        assert!(matches!(err, SyncError::InvalidPath { .. }));
    }

    #[test]
    fn test_dir_entry_resolve_root_itself() {
        let entry = DirEntry::new(Path::new("/mirror"), PathBuf::from("/etc/nixos"));
        assert!(entry.resolve(Path::new("/etc/nixos")).is_err());
        assert!(!entry.contains(Path::new("/etc/nixos")));
    }

    #[test]
    fn test_dir_entry_contains_is_component_wise() {
        let entry = DirEntry::new(Path::new("/mirror"), PathBuf::from("/home/u/.config"));
        assert!(entry.contains(Path::new("/home/u/.config/nvim/init.lua")));
        assert!(!entry.contains(Path::new("/home/u/.config-backup/x")));
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let root = Path::new("/mirror");
        let a = mirror_destination(root, Path::new("/etc/hosts"));
        let b = mirror_destination(root, Path::new("/etc/hosts"));
        assert_eq!(a, b);
    }
}
