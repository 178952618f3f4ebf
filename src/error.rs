//! Error types for the multilevel processing engine.

use crate::context::ProcessingContext;
use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Processing error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Execution,
    Timeout,
    LevelNotFound,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Execution => "EXECUTION",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::LevelNotFound => "LEVEL_NOT_FOUND",
            ErrorKind::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload carried by a [`ProcessingError`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorDetails {
    Validation {
        errors: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Execution {
        level_id: String,
        /// Absent when the failure happened outside a phase
        #[serde(skip_serializing_if = "Option::is_none")]
        phase: Option<Phase>,
        elapsed_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    Timeout {
        level_id: String,
        timeout_ms: u64,
        phases: Vec<Phase>,
        triggered_at: String,
    },
    #[serde(rename_all = "camelCase")]
    LevelNotFound {
        level_id: String,
        available_levels: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Cancelled {
        cancelled: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        cancel_time: Option<String>,
        elapsed_since_cancellation_ms: u64,
    },
}

impl ErrorDetails {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorDetails::Validation { .. } => ErrorKind::Validation,
            ErrorDetails::Execution { .. } => ErrorKind::Execution,
            ErrorDetails::Timeout { .. } => ErrorKind::Timeout,
            ErrorDetails::LevelNotFound { .. } => ErrorKind::LevelNotFound,
            ErrorDetails::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Level the failure is attributed to, if any
    pub fn level_id(&self) -> Option<&str> {
        match self {
            ErrorDetails::Execution { level_id, .. }
            | ErrorDetails::Timeout { level_id, .. }
            | ErrorDetails::LevelNotFound { level_id, .. } => Some(level_id),
            ErrorDetails::Validation { .. } | ErrorDetails::Cancelled { .. } => None,
        }
    }
}

/// Typed failure of a processing run or a level lookup.
///
/// Failures raised after the context was initialized carry the partially
/// populated context, so artifacts committed before the failure stay
/// inspectable.
#[derive(Debug, Error)]
#[error("[{kind}] {message}", kind = .details.kind())]
pub struct ProcessingError {
    pub message: String,
    pub details: ErrorDetails,
    pub context: Option<Box<ProcessingContext>>,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl ProcessingError {
    pub fn new(message: impl Into<String>, details: ErrorDetails) -> Self {
        Self {
            message: message.into(),
            details,
            context: None,
            source: None,
        }
    }

    pub fn validation(errors: Vec<String>) -> Self {
        Self::new(
            format!("Invalid context: {}", errors.join(", ")),
            ErrorDetails::Validation { errors },
        )
    }

    pub fn level_not_found(level_id: &str, available_levels: Vec<String>) -> Self {
        Self::new(
            format!("Level {} not found", level_id),
            ErrorDetails::LevelNotFound {
                level_id: level_id.to_string(),
                available_levels,
            },
        )
    }

    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_context(mut self, context: ProcessingContext) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.details.kind()
    }

    /// Partial context captured when the run failed
    pub fn partial_context(&self) -> Option<&ProcessingContext> {
        self.context.as_deref()
    }
}

/// Setup errors: configuration loading and logging initialization
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid level '{level_id}': {reason}")]
    InvalidLevel { level_id: String, reason: String },

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}
