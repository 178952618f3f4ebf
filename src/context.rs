//! Processing context: the state threaded through a single `process` call.
//!
//! A context is created fresh for every run, mutated in place only by the cycle
//! executor during that run, and handed back to the caller (or attached to the
//! failure) when the run resolves.

mod input;

pub use input::{initialize_context, validate_input, RESERVED_FIELDS};

use crate::error::ErrorKind;
use crate::phase::Phase;
use crate::telemetry::now_millis;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Completion state of a processing journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CompletionState {
    /// Not finished yet
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "COMPLETE")]
    Complete,
    /// Failed for any reason other than timeout or cancellation
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "TIMEOUT")]
    Timeout,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl CompletionState {
    /// Completion state recorded for a failure of the given kind
    pub fn for_failure(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Timeout => CompletionState::Timeout,
            ErrorKind::Cancelled => CompletionState::Cancelled,
            _ => CompletionState::Rejected,
        }
    }
}

/// Error summary stored on the journey of a failed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneyError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJourney {
    pub completion_state: CompletionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JourneyError>,
}

/// Phase marker reported by [`ProcessingStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrentPhase {
    /// Between phases, or before the first one
    #[default]
    Idle,
    Running(Phase),
    Complete,
}

impl Serialize for CurrentPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CurrentPhase::Idle => serializer.serialize_str(""),
            CurrentPhase::Running(phase) => serializer.serialize_str(phase.as_str()),
            CurrentPhase::Complete => serializer.serialize_str("complete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatus {
    pub current_phase: CurrentPhase,
    /// Fraction of phases completed, in `[0, 1]`
    pub progress: f64,
    /// Milliseconds since the Unix epoch
    pub start_time: u64,
    pub completed_phases: Vec<Phase>,
}

impl ProcessingStatus {
    pub fn new(start_time: u64) -> Self {
        Self {
            current_phase: CurrentPhase::Idle,
            progress: 0.0,
            start_time,
            completed_phases: Vec::new(),
        }
    }
}

/// Recorded output of one phase execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// `{levelId}_{phase}`
    pub layer_id: String,
    pub timestamp: String,
    /// Context dimension at the time the artifact was created
    pub dimension: f64,
    pub content: Value,
}

impl Artifact {
    pub fn layer_key(level_id: &str, phase: Phase) -> String {
        format!("{}_{}", level_id, phase.as_str())
    }
}

/// Artifacts keyed by layer id, in execution order.
///
/// Only shared access to stored artifacts is exposed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArtifactLedger {
    entries: Vec<Artifact>,
}

impl ArtifactLedger {
    pub fn get(&self, layer_id: &str) -> Option<&Artifact> {
        self.entries.iter().find(|a| a.layer_id == layer_id)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.get(layer_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|a| a.layer_id.as_str())
    }

    /// Stores an artifact. A level that lists a phase twice produces the same
    /// key twice; the later artifact replaces the earlier one in place.
    pub(crate) fn insert(&mut self, artifact: Artifact) -> &Artifact {
        let index = match self
            .entries
            .iter()
            .position(|a| a.layer_id == artifact.layer_id)
        {
            Some(index) => {
                self.entries[index] = artifact;
                index
            }
            None => {
                self.entries.push(artifact);
                self.entries.len() - 1
            }
        };
        &self.entries[index]
    }
}

struct ByLayer<'a>(&'a [Artifact]);

impl Serialize for ByLayer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for artifact in self.0 {
            map.serialize_entry(&artifact.layer_id, artifact)?;
        }
        map.end()
    }
}

impl Serialize for ArtifactLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ArtifactLedger", 1)?;
        state.serialize_field("byLayer", &ByLayer(&self.entries))?;
        state.end()
    }
}

/// Context threaded through one processing run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingContext {
    pub dimension: f64,
    pub processing_journey: ProcessingJourney,
    #[serde(rename = "dimensionalArtifacts")]
    pub artifacts: ArtifactLedger,
    pub status: ProcessingStatus,
    /// Caller-supplied fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessingContext {
    pub fn new(dimension: f64) -> Self {
        Self {
            dimension,
            processing_journey: ProcessingJourney::default(),
            artifacts: ArtifactLedger::default(),
            status: ProcessingStatus::new(now_millis()),
            extra: Map::new(),
        }
    }

    pub fn completion_state(&self) -> CompletionState {
        self.processing_journey.completion_state
    }

    pub fn artifact(&self, layer_id: &str) -> Option<&Artifact> {
        self.artifacts.get(layer_id)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Merged view: engine-owned fields plus pass-through fields
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
