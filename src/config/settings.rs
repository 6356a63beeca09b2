use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::env_vars::expand_path;
use crate::constants::*;

/// Tuning knobs for a collection run, loadable from YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// Wall-clock bound for each enumeration command
    pub command_timeout_secs: u64,
    /// Wall-clock bound for the external scanner
    pub scanner_timeout_secs: u64,
    /// Scanner bound used when deep mode is on
    pub deep_scanner_timeout_secs: u64,
    pub fingerprint_max_files: usize,
    pub fingerprint_max_file_size_mb: u64,
    /// Characters of scanner output kept before truncation
    pub scanner_output_cap: usize,
    /// Replaces the default watched directories when set.
    /// Entries may use `$VAR`, `${VAR}` or `%VAR%`.
    pub watched_directories: Option<Vec<String>>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            scanner_timeout_secs: DEFAULT_SCANNER_TIMEOUT_SECS,
            deep_scanner_timeout_secs: DEEP_SCANNER_TIMEOUT_SECS,
            fingerprint_max_files: DEFAULT_FINGERPRINT_MAX_FILES,
            fingerprint_max_file_size_mb: DEFAULT_FINGERPRINT_MAX_FILE_SIZE_MB,
            scanner_output_cap: DEFAULT_SCANNER_OUTPUT_CAP,
            watched_directories: None,
        }
    }
}

impl CollectorSettings {
    /// Load settings from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let settings: CollectorSettings =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
        settings.validate()?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize settings to YAML")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, yaml).context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Reject values that would make a probe unable to run at all
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == 0 {
            bail!("command_timeout_secs must be greater than zero");
        }
        if self.scanner_timeout_secs == 0 || self.deep_scanner_timeout_secs == 0 {
            bail!("scanner timeouts must be greater than zero");
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn scanner_timeout(&self, deep_mode: bool) -> Duration {
        if deep_mode {
            Duration::from_secs(self.deep_scanner_timeout_secs)
        } else {
            Duration::from_secs(self.scanner_timeout_secs)
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.fingerprint_max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Configured watched directories with environment variables expanded
    pub fn expanded_watched_directories(&self) -> Option<Vec<PathBuf>> {
        self.watched_directories
            .as_ref()
            .map(|dirs| dirs.iter().map(|d| expand_path(d)).collect())
    }
}

/// Load settings from `path`, or use the defaults when no path is given
pub fn load_settings(config_path: Option<&Path>) -> Result<CollectorSettings> {
    match config_path {
        Some(path) => CollectorSettings::from_yaml_file(path),
        None => {
            info!("No config path provided, using default settings");
            Ok(CollectorSettings::default())
        }
    }
}
