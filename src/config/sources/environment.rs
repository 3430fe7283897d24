//! Environment variable source: KBASE__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use std::collections::HashMap;

/// Keys whose environment values are comma-separated lists.
const LIST_KEYS: &[&str] = &["merge.deprecated_prefixes"];

fn source(vars: Option<HashMap<String, String>>) -> Environment {
    let env = Environment::with_prefix("KBASE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",");
    LIST_KEYS
        .iter()
        .fold(env, |env, key| env.with_list_parse_key(key))
        .source(vars)
}

/// Add the process environment overlay, e.g. `KBASE__PATHS__CONFIG_FILE`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(source(None)))
}

/// Same overlay, read from an explicit variable map instead of the process environment.
pub fn add_vars_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vars: HashMap<String, String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(source(Some(vars))))
}
