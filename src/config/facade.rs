//! Config loading entry point: layers sources in precedence order.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::EngineConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Environment variable prefix; nested keys use a double underscore,
/// e.g. `MULTILEVEL_DEFAULT_LEVEL__TIMEOUT_MS`.
const ENV_PREFIX: &str = "MULTILEVEL";
const ENV_SEPARATOR: &str = "__";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{MULTILEVEL_ENV}.toml`,
    /// environment variables.
    pub fn load(workspace_root: &Path) -> Result<EngineConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load a single file over the defaults. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    /// Global config file location, if a config home can be determined
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    pub fn default_config() -> EngineConfig {
        EngineConfig::default()
    }
}
