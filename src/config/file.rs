//! JSON configuration file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// On-disk configuration. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub mirror_root: Option<PathBuf>,
    #[serde(default)]
    pub track: Vec<PathBuf>,
    pub log_level: Option<String>,
    pub channel_capacity: Option<usize>,
    pub drain_timeout_ms: Option<u64>,
}

impl FileConfig {
    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file '{}': {e}", path.display()))
        })?;
        Self::parse(&text)
            .map_err(|e| Error::config(format!("invalid config file '{}': {e}", path.display())))
    }

    fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
