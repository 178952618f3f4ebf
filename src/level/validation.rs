//! Level validation shared by add and edit.

use crate::level::Level;
use crate::phase::Phase;
use std::fmt;

/// Every problem found with a level definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelValidation {
    pub level_id: String,
    pub errors: Vec<String>,
}

impl LevelValidation {
    fn new(level_id: &str) -> Self {
        Self {
            level_id: level_id.to_string(),
            errors: Vec::new(),
        }
    }

    fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for LevelValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join(", "))
    }
}

impl std::error::Error for LevelValidation {}

/// Validate a level definition and build the record.
pub fn validate_level<S: AsRef<str>>(
    level_id: &str,
    dimension: f64,
    phases: &[S],
    timeout_ms: u64,
    min_timeout_ms: u64,
) -> Result<Level, LevelValidation> {
    let mut result = LevelValidation::new(level_id);

    if level_id.is_empty() {
        result.add_error("Level ID must be a non-empty string".to_string());
    }

    if !(dimension.is_finite() && dimension > 0.0) {
        result.add_error("Dimension must be a positive number".to_string());
    }

    let mut parsed = Vec::with_capacity(phases.len());
    if phases.is_empty() {
        result.add_error("Phases must be a non-empty array".to_string());
    } else {
        let mut invalid = Vec::new();
        for phase in phases {
            match phase.as_ref().parse::<Phase>() {
                Ok(phase) => parsed.push(phase),
                Err(_) => invalid.push(phase.as_ref().to_string()),
            }
        }
        if !invalid.is_empty() {
            result.add_error(format!(
                "Invalid phases: {}. Valid phases are: {}",
                invalid.join(", "),
                Phase::valid_names()
            ));
        }
    }

    if timeout_ms < min_timeout_ms {
        result.add_error(format!("Timeout must be at least {}ms", min_timeout_ms));
    }

    if result.is_valid() {
        Ok(Level {
            id: level_id.to_string(),
            dimension,
            phases: parsed,
            timeout_ms,
        })
    } else {
        Err(result)
    }
}
