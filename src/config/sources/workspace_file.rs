//! Per-project config files under `<root>/config/`

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use std::path::{Path, PathBuf};

use super::layer_if_present;

/// Selects the environment overlay, `config/<env>.toml`.
pub const ENV_VAR: &str = "MULTILEVEL_ENV";
const DEFAULT_ENV: &str = "development";

/// Project files in ascending precedence: the shared base, then the overlay
/// for `env`.
pub fn workspace_config_paths(workspace_root: &Path, env: &str) -> [PathBuf; 2] {
    let dir = workspace_root.join("config");
    [dir.join("config.toml"), dir.join(format!("{}.toml", env))]
}

fn active_env() -> String {
    std::env::var(ENV_VAR)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

/// Layer whichever project files exist onto the builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let paths = workspace_config_paths(workspace_root, &active_env());
    Ok(paths
        .iter()
        .fold(builder, |builder, path| layer_if_present(builder, path, "workspace")))
}
