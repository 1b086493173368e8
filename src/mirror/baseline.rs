//! Initial full mirror of every tracked path.

use std::fs;

use super::copy::Copier;
use super::plan::MirrorPlan;
use crate::error::{BaselineError, SyncError};
use crate::Result;

/// Outcome of the initial mirror.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BaselineReport {
    pub files_copied: u64,
    pub files_failed: u64,
    pub dirs_copied: u64,
    /// Files copied inside tracked directories.
    pub tree_files: u64,
    pub bytes: u64,
}

/// Build the baseline mirror.
///
/// Tracked files are copied individually; a failure is logged and counted
/// but does not stop the run. Tracked directories replace their destination
/// wholesale (remove, then copy), and any failure there aborts the baseline.
///
/// # Errors
///
/// Returns [`BaselineError`] if the mirror root cannot be created or a
/// tracked directory cannot be mirrored.
pub fn run_baseline<C: Copier + ?Sized>(plan: &MirrorPlan, copier: &C) -> Result<BaselineReport> {
    let mut report = BaselineReport::default();

    fs::create_dir_all(plan.mirror_root()).map_err(|e| BaselineError::MirrorRoot {
        path: plan.mirror_root().display().to_string(),
        reason: e.to_string(),
    })?;

    for entry in plan.files() {
        let result = entry
            .destination
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| copier.copy_file(&entry.source, &entry.destination));

        match result {
            Ok(bytes) => {
                report.files_copied += 1;
                report.bytes += bytes;
                tracing::info!(
                    source = %entry.source.display(),
                    destination = %entry.destination.display(),
                    "Copied file"
                );
            }
            Err(e) => {
                report.files_failed += 1;
                let err = SyncError::from_io(&e, &entry.source, &entry.destination);
                tracing::warn!(error = %err, "Initial copy failed");
            }
        }
    }

    for entry in plan.dirs() {
        let replace = copier
            .remove_tree(&entry.destination_root)
            .and_then(|()| copier.copy_tree(&entry.source_root, &entry.destination_root));

        let stats = replace.map_err(|e| BaselineError::DirectoryCopy {
            path: entry.source_root.display().to_string(),
            destination: entry.destination_root.display().to_string(),
            reason: e.to_string(),
        })?;

        report.dirs_copied += 1;
        report.tree_files += stats.files;
        report.bytes += stats.bytes;
        tracing::info!(
            source = %entry.source_root.display(),
            destination = %entry.destination_root.display(),
            files = stats.files,
            skipped = stats.skipped,
            "Copied directory"
        );
    }

    tracing::info!(
        files = report.files_copied,
        failed = report.files_failed,
        dirs = report.dirs_copied,
        bytes = report.bytes,
        "Baseline complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::copy::{FsCopier, TreeCopyStats};
    use crate::Error;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    /// Copier whose tree copy always fails.
    struct BrokenTree;

    impl Copier for BrokenTree {
        fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<u64> {
            FsCopier.copy_file(src, dst)
        }

        fn copy_tree(&self, _src: &Path, _dst: &Path) -> io::Result<TreeCopyStats> {
            Err(io::Error::other("device full"))
        }

        fn remove_tree(&self, dst: &Path) -> io::Result<()> {
            FsCopier.remove_tree(dst)
        }
    }

    fn fixture() -> (TempDir, MirrorPlan) {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        fs::create_dir_all(home.join(".config/nvim")).unwrap();
        fs::write(home.join(".bashrc"), "alias ll='ls -l'\n").unwrap();
        fs::write(home.join(".config/nvim/init.lua"), "vim.o.number = true\n").unwrap();

        let plan = MirrorPlan::build(
            &tmp.path().join("mirror"),
            &[home.join(".bashrc"), home.join(".config")],
        )
        .unwrap();
        (tmp, plan)
    }

    #[test]
    fn test_baseline_copies_files_and_dirs() {
        let (_tmp, plan) = fixture();

        let report = run_baseline(&plan, &FsCopier).unwrap();

        assert_eq!(report.files_copied, 1);
        assert_eq!(report.dirs_copied, 1);
        assert_eq!(report.tree_files, 1);
        let file = &plan.files()[0];
        assert_eq!(
            fs::read(&file.destination).unwrap(),
            fs::read(&file.source).unwrap()
        );
        let dir = &plan.dirs()[0];
        assert!(dir.destination_root.join("nvim/init.lua").is_file());
    }

    #[test]
    fn test_baseline_replaces_stale_directory() {
        let (_tmp, plan) = fixture();
        let dir = &plan.dirs()[0];
        fs::create_dir_all(&dir.destination_root).unwrap();
        fs::write(dir.destination_root.join("stale.txt"), "old").unwrap();

        run_baseline(&plan, &FsCopier).unwrap();

        assert!(!dir.destination_root.join("stale.txt").exists());
        assert!(dir.destination_root.join("nvim/init.lua").exists());
    }

    #[test]
    fn test_baseline_file_failure_is_not_fatal() {
        let (_tmp, plan) = fixture();
        fs::remove_file(&plan.files()[0].source).unwrap();

        let report = run_baseline(&plan, &FsCopier).unwrap();

        assert_eq!(report.files_copied, 0);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.dirs_copied, 1);
    }

    #[test]
    fn test_baseline_directory_failure_is_fatal() {
        let (_tmp, plan) = fixture();

        let err = run_baseline(&plan, &BrokenTree).unwrap_err();

        assert!(matches!(
            err,
            Error::Baseline(BaselineError::DirectoryCopy { .. })
        ));
        assert!(err.to_string().contains("device full"));
    }
}
