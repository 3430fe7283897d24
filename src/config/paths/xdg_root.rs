//! XDG Base Directory helpers for kbase's own files.

use crate::error::ConfigError;
use std::path::PathBuf;

const APP_DIR: &str = "kbase";

/// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn config_home() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config"))
        .ok_or(ConfigError::NoConfigHome)
}

/// `$XDG_CONFIG_HOME/kbase`
pub fn app_config_dir() -> Result<PathBuf, ConfigError> {
    Ok(config_home()?.join(APP_DIR))
}

/// `$XDG_CONFIG_HOME/kbase/settings.toml`
pub fn default_settings_file() -> Result<PathBuf, ConfigError> {
    Ok(app_config_dir()?.join("settings.toml"))
}

/// `$XDG_CONFIG_HOME/kbase/config.json`
pub fn default_config_file() -> Result<PathBuf, ConfigError> {
    Ok(app_config_dir()?.join("config.json"))
}
