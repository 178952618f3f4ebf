//! Configuration System
//!
//! Engine settings and seed levels, loaded hierarchically: built-in defaults,
//! the global config file, workspace config files, then `MULTILEVEL__*`-style
//! environment overrides.

use crate::level::validate_level;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Level definition as it appears in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: String,
    pub dimension: f64,
    pub phases: Vec<String>,
    pub timeout_ms: u64,
}

impl LevelConfig {
    /// The `STANDARD` level every engine starts with
    pub fn standard() -> Self {
        Self {
            id: "STANDARD".to_string(),
            dimension: 1.0,
            phases: vec!["processing".to_string()],
            timeout_ms: 5000,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Smallest timeout a level may declare
    #[serde(default = "default_min_timeout_ms")]
    pub min_timeout_ms: u64,

    /// Selection distance beyond which a mismatch warning is logged
    #[serde(default = "default_max_dimension_distance")]
    pub max_dimension_distance: f64,

    /// Context dimension used when the caller supplies none
    #[serde(default = "default_dimension")]
    pub default_dimension: f64,

    /// Log run lifecycle at info instead of debug
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "LevelConfig::standard")]
    pub default_level: LevelConfig,

    /// Additional levels registered after the default level, in order
    #[serde(default)]
    pub levels: Vec<LevelConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_min_timeout_ms() -> u64 {
    1000
}

fn default_max_dimension_distance() -> f64 {
    1.0
}

fn default_dimension() -> f64 {
    1.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_timeout_ms: default_min_timeout_ms(),
            max_dimension_distance: default_max_dimension_distance(),
            default_dimension: default_dimension(),
            debug: false,
            default_level: LevelConfig::standard(),
            levels: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Engine(String),
    Level(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Engine(msg) => write!(f, "Engine: {}", msg),
            ValidationError::Level(id, msg) => write!(f, "Level '{}': {}", id, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl EngineConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.min_timeout_ms == 0 {
            errors.push(ValidationError::Engine(
                "min_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if !(self.max_dimension_distance.is_finite() && self.max_dimension_distance >= 0.0) {
            errors.push(ValidationError::Engine(
                "max_dimension_distance must be a non-negative number".to_string(),
            ));
        }
        if !(self.default_dimension.is_finite() && self.default_dimension > 0.0) {
            errors.push(ValidationError::Engine(
                "default_dimension must be a positive number".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for level in self.seed_levels() {
            if let Err(validation) = validate_level(
                &level.id,
                level.dimension,
                &level.phases,
                level.timeout_ms,
                self.min_timeout_ms,
            ) {
                errors.push(ValidationError::Level(
                    level.id.clone(),
                    validation.to_string(),
                ));
            }
            if !seen.insert(level.id.as_str()) {
                errors.push(ValidationError::Level(
                    level.id.clone(),
                    "Duplicate level id".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Default level followed by the configured levels
    pub fn seed_levels(&self) -> impl Iterator<Item = &LevelConfig> {
        std::iter::once(&self.default_level).chain(self.levels.iter())
    }
}
