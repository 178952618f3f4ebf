//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("min_timeout_ms", 1000i64)?
        .set_default("max_dimension_distance", 1.0)?
        .set_default("default_dimension", 1.0)?
        .set_default("debug", false)?
        .set_default("default_level.id", "STANDARD")?
        .set_default("default_level.dimension", 1.0)?
        .set_default("default_level.phases", vec!["processing"])?
        .set_default("default_level.timeout_ms", 5000i64)
}
