//! Configuration management for dotsync.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - JSON configuration file (lowest priority)

mod file;
mod settings;

pub use file::FileConfig;
pub use settings::{Config, DEFAULT_CHANNEL_CAPACITY, DEFAULT_DRAIN_TIMEOUT, DEFAULT_MIRROR_ROOT};
