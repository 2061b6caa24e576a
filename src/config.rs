//! Framework-wide configuration.
//!
//! The configuration is a plain serde struct with defaults for every field,
//! so a JSON file only needs to mention the settings it changes.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration options shared by the algorithm manager and the functions
/// it hands to running algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// `tracing_subscriber` filter used when `RUST_LOG` is unset. Default: "info"
    pub log_filter: String,

    /// Maximum number of creation records kept by the algorithm manager. Default: 100
    pub algorithm_history_limit: usize,

    /// Minimum number of spectra before per-spectrum work is run on the
    /// rayon pool. Default: 64
    pub parallel_threshold: usize,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            algorithm_history_limit: 100,
            parallel_threshold: 64,
        }
    }
}

impl FrameworkConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Write the configuration to a file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
