//! Lifecycle events emitted during a processing run.
//!
//! Events borrow from the running context; listeners are invoked synchronously
//! and must copy whatever they want to keep.

use crate::context::{Artifact, ProcessingContext};
use crate::error::ProcessingError;
use crate::phase::Phase;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy)]
pub enum ProcessingEvent<'a> {
    ProcessingStarted {
        level_id: &'a str,
        context: &'a ProcessingContext,
    },
    PhaseStarted {
        level_id: &'a str,
        phase: Phase,
        context: &'a ProcessingContext,
    },
    PhaseCompleted {
        level_id: &'a str,
        phase: Phase,
        artifact: &'a Artifact,
        duration_ms: u64,
    },
    ProcessingCompleted {
        result: &'a ProcessingContext,
        duration_ms: u64,
    },
    ProcessingFailed {
        error: &'a ProcessingError,
        context: &'a ProcessingContext,
    },
}

impl<'a> ProcessingEvent<'a> {
    pub fn event_type(&self) -> &'static str {
        match self {
            ProcessingEvent::ProcessingStarted { .. } => "processingStarted",
            ProcessingEvent::PhaseStarted { .. } => "phaseStarted",
            ProcessingEvent::PhaseCompleted { .. } => "phaseCompleted",
            ProcessingEvent::ProcessingCompleted { .. } => "processingCompleted",
            ProcessingEvent::ProcessingFailed { .. } => "processingFailed",
        }
    }

    pub fn level_id(&self) -> Option<&'a str> {
        match *self {
            ProcessingEvent::ProcessingStarted { level_id, .. }
            | ProcessingEvent::PhaseStarted { level_id, .. }
            | ProcessingEvent::PhaseCompleted { level_id, .. } => Some(level_id),
            ProcessingEvent::ProcessingFailed { error, .. } => error.details.level_id(),
            ProcessingEvent::ProcessingCompleted { .. } => None,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match *self {
            ProcessingEvent::PhaseStarted { phase, .. }
            | ProcessingEvent::PhaseCompleted { phase, .. } => Some(phase),
            _ => None,
        }
    }

    /// Compact JSON payload for log records; contexts are summarized, not copied.
    pub fn summary(&self) -> Value {
        match self {
            ProcessingEvent::ProcessingStarted { level_id, context } => json!({
                "level_id": level_id,
                "dimension": context.dimension,
            }),
            ProcessingEvent::PhaseStarted {
                level_id,
                phase,
                context,
            } => json!({
                "level_id": level_id,
                "phase": phase.as_str(),
                "progress": context.status.progress,
            }),
            ProcessingEvent::PhaseCompleted {
                level_id,
                phase,
                artifact,
                duration_ms,
            } => json!({
                "level_id": level_id,
                "phase": phase.as_str(),
                "layer_id": artifact.layer_id,
                "duration_ms": duration_ms,
            }),
            ProcessingEvent::ProcessingCompleted {
                result,
                duration_ms,
            } => json!({
                "artifacts": result.artifacts.len(),
                "dimension": result.dimension,
                "duration_ms": duration_ms,
            }),
            ProcessingEvent::ProcessingFailed { error, context } => json!({
                "type": error.kind().as_str(),
                "message": error.message,
                "artifacts": context.artifacts.len(),
            }),
        }
    }
}
