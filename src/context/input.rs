//! Raw input validation and context initialization.

use super::{ArtifactLedger, ProcessingContext, ProcessingJourney, ProcessingStatus};
use crate::error::ProcessingError;
use crate::telemetry::now_millis;
use serde_json::{Map, Value};

/// Fields owned by the engine; caller values for these never pass through.
pub const RESERVED_FIELDS: [&str; 4] = [
    "dimension",
    "processingJourney",
    "dimensionalArtifacts",
    "status",
];

/// Validate raw caller input before any state is touched.
///
/// The input must be an object. A declared `dimension` must be a positive
/// number; declared `processingJourney` / `dimensionalArtifacts` must be objects.
pub fn validate_input(input: &Value) -> Result<&Map<String, Value>, ProcessingError> {
    let Some(fields) = input.as_object() else {
        return Err(ProcessingError::validation(vec![
            "Context must be an object".to_string(),
        ]));
    };

    let mut errors = Vec::new();

    if let Some(dimension) = fields.get("dimension") {
        let positive = dimension
            .as_f64()
            .map(|d| d.is_finite() && d > 0.0)
            .unwrap_or(false);
        if !positive {
            errors.push("Context dimension must be a positive number".to_string());
        }
    }

    for key in ["processingJourney", "dimensionalArtifacts"] {
        if let Some(value) = fields.get(key) {
            if !value.is_object() {
                errors.push(format!("Context {} must be an object", key));
            }
        }
    }

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(ProcessingError::validation(errors))
    }
}

/// Build a fresh context from validated caller fields.
///
/// The caller's `dimension` wins over the default; bookkeeping fields are
/// always engine-initialized.
pub fn initialize_context(fields: &Map<String, Value>, default_dimension: f64) -> ProcessingContext {
    let dimension = fields
        .get("dimension")
        .and_then(Value::as_f64)
        .unwrap_or(default_dimension);

    let extra = fields
        .iter()
        .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    ProcessingContext {
        dimension,
        processing_journey: ProcessingJourney::default(),
        artifacts: ArtifactLedger::default(),
        status: ProcessingStatus::new(now_millis()),
        extra,
    }
}
