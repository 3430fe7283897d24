//! Global settings file: `$XDG_CONFIG_HOME/kbase/settings.toml` (optional).

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::default_settings_file() {
        Ok(path) => Ok(builder.add_source(
            File::from(path.as_path())
                .format(FileFormat::Toml)
                .required(false),
        )),
        Err(e) => {
            tracing::debug!(error = %e, "no global settings file location");
            Ok(builder)
        }
    }
}
