//! Processing levels: definitions, registry, and dimension-based selection.

pub mod registry;
pub mod selector;
pub mod validation;

pub use registry::LevelRegistry;
pub use selector::{DimensionSelector, Selection};
pub use validation::{validate_level, LevelValidation};

use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A named configuration selecting ordered phases, a timeout, and a dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: String,
    pub dimension: f64,
    pub phases: Vec<Phase>,
    pub timeout_ms: u64,
}

impl Level {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Level record plus its current position in the level order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    #[serde(flatten)]
    pub level: Level,
    pub position: usize,
}

/// Partial update applied by `edit_level`. The level id is not editable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LevelUpdate {
    pub dimension: Option<f64>,
    pub phases: Option<Vec<String>>,
    pub timeout_ms: Option<u64>,
}

impl LevelUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimension(mut self, dimension: f64) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn phases<S: AsRef<str>>(mut self, phases: &[S]) -> Self {
        self.phases = Some(phases.iter().map(|p| p.as_ref().to_string()).collect());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dimension.is_none() && self.phases.is_none() && self.timeout_ms.is_none()
    }
}
