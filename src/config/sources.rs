pub mod global_file;
pub mod workspace_file;

use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::Path;
use tracing::debug;

/// Layer `path` onto the builder when it exists; a missing file is not an error.
pub(crate) fn layer_if_present(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    source: &'static str,
) -> ConfigBuilder<DefaultState> {
    if !path.exists() {
        debug!(source, config_path = %path.display(), "configuration file not found");
        return builder;
    }
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    builder.add_source(File::from(resolved).required(false))
}
