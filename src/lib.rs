//! Multilevel: a level/phase cycle engine
//!
//! Registers named processing levels (a dimension, an ordered list of phases,
//! and a timeout), picks the level whose dimension best matches a request, and
//! runs that level's phases in order against a fresh context. Each phase
//! records an artifact; runs are raced against the level's timeout, can be
//! cancelled cooperatively, and announce their lifecycle on an event bus.

pub mod cancellation;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod level;
pub mod logging;
pub mod phase;
pub mod processor;
pub mod telemetry;

pub use cancellation::{CancellationToken, CancellationTokenSource};
pub use config::{ConfigLoader, EngineConfig, LevelConfig};
pub use context::{Artifact, CompletionState, CurrentPhase, ProcessingContext};
pub use engine::Engine;
pub use error::{EngineError, ErrorDetails, ErrorKind, ProcessingError};
pub use level::{Level, LevelInfo, LevelUpdate, Selection};
pub use phase::Phase;
pub use processor::{FnProcessor, PhaseProcessor};
pub use telemetry::{ListenerId, ProcessingEvent};
