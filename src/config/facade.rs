//! SettingsLoader: composes the settings sources and deserializes `Settings`.

use super::sources::{environment, global_file, settings_file};
use super::Settings;
use crate::merge::DEFAULT_DEPRECATED_PREFIXES;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use std::collections::HashMap;
use std::path::Path;

/// Settings loader facade.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
        let builder = Self::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = match explicit {
            Some(path) => settings_file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Load from one file plus an explicit variable map, ignoring the global file.
    pub fn load_isolated(
        file: Option<&Path>,
        vars: HashMap<String, String>,
    ) -> Result<Settings, ConfigError> {
        let builder = Self::builder_with_defaults()?;
        let builder = match file {
            Some(path) => settings_file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_vars_to_builder(builder, vars)?;
        builder.build()?.try_deserialize()
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("merge.deprecated_prefixes", DEFAULT_DEPRECATED_PREFIXES.to_vec())?
            .set_default("upgrade.auto_upgrade_on_start", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.output", "stderr")
    }
}
