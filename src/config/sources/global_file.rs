//! Global config file source: $XDG_CONFIG_HOME/multilevel/config.toml or ~/.config/multilevel/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use std::path::PathBuf;

use super::layer_if_present;

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(config_home.join("multilevel").join("config.toml"))
}

/// Add global config file source to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(match global_config_path() {
        Some(path) => layer_if_present(builder, &path, "global"),
        None => builder,
    })
}
