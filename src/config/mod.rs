//! Runtime Settings
//!
//! Settings for the kbase program itself, distinct from the managed
//! configuration document. Layered with the `config` crate:
//! defaults -> global `settings.toml` -> `--settings` file -> `KBASE__*` environment.

pub mod facade;
pub mod paths;
pub mod sources;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::merge::{DeprecatedKeyFilter, DEFAULT_DEPRECATED_PREFIXES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use facade::SettingsLoader;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub merge: MergeSettings,
    #[serde(default)]
    pub upgrade: UpgradeSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the managed document, its template override, and its backups live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    #[serde(default)]
    pub default_template: Option<PathBuf>,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    #[serde(default = "default_deprecated_prefixes")]
    pub deprecated_prefixes: Vec<String>,
}

fn default_deprecated_prefixes() -> Vec<String> {
    DEFAULT_DEPRECATED_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            deprecated_prefixes: default_deprecated_prefixes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSettings {
    /// Run the template upgrade at startup when `server.version` differs.
    #[serde(default = "default_true")]
    pub auto_upgrade_on_start: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            auto_upgrade_on_start: true,
        }
    }
}

impl Settings {
    /// Managed configuration document path.
    pub fn config_file(&self) -> Result<PathBuf, ConfigError> {
        match &self.paths.config_file {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => paths::xdg_root::default_config_file(),
        }
    }

    /// Backup directory; defaults to `backups/` next to the config file.
    pub fn backup_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = self.paths.backup_dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            return Ok(dir.clone());
        }
        let config_file = self.config_file()?;
        let parent = config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(parent.join("backups"))
    }

    pub fn deprecated_filter(&self) -> DeprecatedKeyFilter {
        DeprecatedKeyFilter::new(self.merge.deprecated_prefixes.iter().cloned())
    }
}
