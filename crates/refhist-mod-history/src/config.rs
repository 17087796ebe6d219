/// Configuration file for tracked histories.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use refhist_core::FlushMode;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "REFHIST_CONFIG";

/// File name looked up next to the executable.
const CONFIG_FILE_NAME: &str = "refhist.json";

/// Serializable subset of `HistoryOptions`.
///
/// Missing keys take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// `"sync"` commits inline, `"pre"` once per scheduler tick.
    pub flush: FlushMode,
    /// Record in-place mutations as well as replacements.
    pub deep: bool,
    /// Deep-copy snapshots through JSON.
    pub clone: bool,
    /// Max undoable steps. `None` = unbounded.
    pub capacity: Option<usize>,
}

impl HistoryConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Loads config from `path`, falling back to defaults on any error.
    ///
    /// A missing file is not an error. A broken file is logged and left
    /// untouched.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{e:#}");
                Self::default()
            }
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}

/// Resolves the configuration file path.
///
/// Resolution order:
/// 1. `REFHIST_CONFIG` environment variable
/// 2. `refhist.json` next to the executable
pub fn resolve_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
    exe.parent()
        .unwrap_or(Path::new("."))
        .join(CONFIG_FILE_NAME)
}
