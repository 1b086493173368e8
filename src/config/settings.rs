//! Configuration settings and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::file::FileConfig;
use crate::{Error, Result};

/// Default mirror root, before `~` expansion.
pub const DEFAULT_MIRROR_ROOT: &str = "~/Repos/dotfiles";

/// Default bounded channel size between the notify thread and the event loop.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default time to wait for an in-flight copy on shutdown.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// Main configuration for dotsync.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the mirror tree.
    pub mirror_root: PathBuf,

    /// Tracked files and directories, in configured order.
    pub tracked: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Capacity of the event hand-off channel.
    pub channel_capacity: usize,

    /// How long shutdown waits for an in-flight copy.
    pub drain_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror_root: PathBuf::from(DEFAULT_MIRROR_ROOT),
            tracked: Vec::new(),
            log_level: "info".to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        config.merge_file(FileConfig::load(path.as_ref())?);
        Ok(config)
    }

    /// Apply values from a config file. Tracked paths are appended.
    pub fn merge_file(&mut self, file: FileConfig) {
        if let Some(root) = file.mirror_root {
            self.mirror_root = root;
        }
        self.tracked.extend(file.track);
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(capacity) = file.channel_capacity {
            self.channel_capacity = capacity;
        }
        if let Some(ms) = file.drain_timeout_ms {
            self.drain_timeout = Duration::from_millis(ms);
        }
    }

    /// Expand a leading `~` in the mirror root and every tracked path.
    #[must_use]
    pub fn expand_home(mut self) -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        if let Some(home) = home.as_deref() {
            self.mirror_root = expand_tilde(&self.mirror_root, home);
            self.tracked = self
                .tracked
                .iter()
                .map(|p| expand_tilde(p, home))
                .collect();
        }
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.mirror_root.as_os_str().is_empty() {
            return Err(Error::config("mirror root cannot be empty"));
        }

        if self.tracked.is_empty() {
            return Err(Error::config("at least one tracked path is required"));
        }

        if let Some(empty) = self.tracked.iter().position(|p| p.as_os_str().is_empty()) {
            return Err(Error::config(format!("tracked path #{empty} is empty")));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.channel_capacity == 0 {
            return Err(Error::config("channel_capacity cannot be 0"));
        }

        if self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(Error::config(format!(
                "channel_capacity cannot exceed {MAX_CHANNEL_CAPACITY}"
            )));
        }

        if self.drain_timeout.is_zero() {
            return Err(Error::config("drain timeout cannot be 0"));
        }

        Ok(())
    }
}

/// Replace a leading `~` component with `home`.
fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
