//! Metadata-preserving file and tree copies.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Counts from a recursive copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeCopyStats {
    pub files: u64,
    pub dirs: u64,
    pub symlinks: u64,
    /// Sockets, FIFOs and device nodes left out of the copy.
    pub skipped: u64,
    pub bytes: u64,
}

/// Filesystem operations used to build and maintain the mirror.
pub trait Copier: Send + Sync {
    /// Copy one file, overwriting `dst` and preserving mtime and permissions.
    ///
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, or `InvalidInput` if `src` is not a
    /// regular file.
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64>;

    /// Recursively copy `src` into `dst`, creating `dst` if needed.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    fn copy_tree(&self, src: &Path, dst: &Path) -> io::Result<TreeCopyStats>;

    /// Remove `dst` and everything below it. Missing paths are not an error.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn remove_tree(&self, dst: &Path) -> io::Result<()>;
}

/// [`Copier`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCopier;

impl Copier for FsCopier {
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64> {
        // Opening a FIFO for reading blocks until a writer shows up.
        if !fs::metadata(src)?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", src.display()),
            ));
        }

        // fs::copy cannot truncate a read-only destination.
        if let Ok(existing) = fs::symlink_metadata(dst) {
            if existing.permissions().readonly() || existing.file_type().is_symlink() {
                fs::remove_file(dst)?;
            }
        }

        let bytes = fs::copy(src, dst)?;
        copy_times(src, dst)?;
        Ok(bytes)
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> io::Result<TreeCopyStats> {
        let mut stats = TreeCopyStats::default();
        fs::create_dir_all(dst)?;

        for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            let target = dst.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                fs::create_dir_all(&target)?;
                stats.dirs += 1;
            } else if file_type.is_symlink() {
                copy_symlink(entry.path(), &target)?;
                stats.symlinks += 1;
            } else if file_type.is_file() {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                stats.bytes += self.copy_file(entry.path(), &target)?;
                stats.files += 1;
            } else {
                tracing::warn!(path = %entry.path().display(), "Skipping special file");
                stats.skipped += 1;
            }
        }

        Ok(stats)
    }

    fn remove_tree(&self, dst: &Path) -> io::Result<()> {
        match fs::symlink_metadata(dst) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(dst),
            Ok(_) => fs::remove_file(dst),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Carry access and modification times from `src` over to `dst`.
fn copy_times(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let mut times = FileTimes::new().set_modified(meta.modified()?);
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    File::open(dst)?.set_times(times)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let link = fs::read_link(src)?;
    if fs::symlink_metadata(dst).is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    FsCopier.copy_file(src, dst).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, when: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_times(FileTimes::new().set_modified(when))
            .unwrap();
    }

    #[test]
    fn test_copy_file_preserves_content_and_mtime() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.conf");
        let dst = tmp.path().join("dst.conf");
        fs::write(&src, "key = value\n").unwrap();
        let past = SystemTime::now() - Duration::from_secs(86_400);
        set_mtime(&src, past);

        let bytes = FsCopier.copy_file(&src, &dst).unwrap();

        assert_eq!(bytes, 12);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "key = value\n");
        assert_eq!(
            fs::metadata(&dst).unwrap().modified().unwrap(),
            fs::metadata(&src).unwrap().modified().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_file_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("script.sh");
        let dst = tmp.path().join("copy.sh");
        fs::write(&src, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o750)).unwrap();

        FsCopier.copy_file(&src, &dst).unwrap();

        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn test_copy_file_overwrites_read_only_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("ro");
        let dst = tmp.path().join("ro.copy");
        fs::write(&src, "v1").unwrap();
        let mut perms = fs::metadata(&src).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&src, perms).unwrap();

        FsCopier.copy_file(&src, &dst).unwrap();
        FsCopier.copy_file(&src, &dst).unwrap();

        assert_eq!(fs::read(&dst).unwrap(), b"v1");
        assert!(fs::metadata(&dst).unwrap().permissions().readonly());
    }

    #[test]
    fn test_copy_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("themes");
        fs::create_dir_all(src.join("foo/assets")).unwrap();
        fs::write(src.join("foo/theme.conf"), "[General]").unwrap();
        fs::write(src.join("foo/assets/bg.png"), [0u8; 16]).unwrap();
        fs::create_dir(src.join("empty")).unwrap();

        let dst = tmp.path().join("mirror/themes");
        let stats = FsCopier.copy_tree(&src, &dst).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.dirs, 3);
        assert_eq!(stats.bytes, 9 + 16);
        assert!(dst.join("empty").is_dir());
        assert_eq!(
            fs::read_to_string(dst.join("foo/theme.conf")).unwrap(),
            "[General]"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_recreates_symlinks() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("cfg");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("real"), "x").unwrap();
        std::os::unix::fs::symlink("real", src.join("link")).unwrap();

        let dst = tmp.path().join("out");
        let stats = FsCopier.copy_tree(&src, &dst).unwrap();

        assert_eq!(stats.symlinks, 1);
        assert_eq!(fs::read_link(dst.join("link")).unwrap(), Path::new("real"));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_skips_special_files() {
        use std::os::unix::net::UnixListener;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("run");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("app.conf"), "x").unwrap();
        let _listener = UnixListener::bind(src.join("app.sock")).unwrap();

        let dst = tmp.path().join("out");
        let stats = FsCopier.copy_tree(&src, &dst).unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.skipped, 1);
        assert!(dst.join("app.conf").is_file());
        assert!(fs::symlink_metadata(dst.join("app.sock")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_file_rejects_special_file() {
        use std::os::unix::net::UnixListener;

        let tmp = TempDir::new().unwrap();
        let sock = tmp.path().join("agent.sock");
        let _listener = UnixListener::bind(&sock).unwrap();

        let err = FsCopier
            .copy_file(&sock, &tmp.path().join("copy"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!tmp.path().join("copy").exists());
    }

    #[test]
    fn test_remove_tree() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("gone");
        fs::create_dir_all(dir.join("a/b")).unwrap();
        fs::write(dir.join("a/b/c"), "x").unwrap();

        FsCopier.remove_tree(&dir).unwrap();
        assert!(!dir.exists());

        // Removing again is a no-op.
        FsCopier.remove_tree(&dir).unwrap();
    }

    #[test]
    fn test_remove_tree_plain_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("stale");
        fs::write(&file, "x").unwrap();

        FsCopier.remove_tree(&file).unwrap();
        assert!(!file.exists());
    }
}
