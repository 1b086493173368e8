//! Mirror tree construction and maintenance.
//!
//! This module provides:
//! - Mapping of tracked paths to their place under the mirror root
//! - The validated, immutable set of tracked entries
//! - The initial full mirror
//! - Idempotent single-file sync

mod baseline;
mod copy;
mod executor;
mod mapper;
mod plan;

pub use baseline::{run_baseline, BaselineReport};
pub use copy::{Copier, FsCopier, TreeCopyStats};
pub use executor::{SyncAction, SyncExecutor};
pub use mapper::{mirror_destination, strip_anchor, DirEntry, FileEntry};
pub use plan::MirrorPlan;
