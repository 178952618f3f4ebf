//! Engine facade
//!
//! Owns the per-instance registries and the event bus, and drives a single
//! `process` call from raw input to a completed (or failed) context.

mod executor;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::cancellation::CancellationToken;
use crate::config::EngineConfig;
use crate::context::{
    initialize_context, validate_input, CompletionState, JourneyError, ProcessingContext,
};
use crate::error::{EngineError, ProcessingError};
use crate::level::{DimensionSelector, Level, LevelInfo, LevelRegistry, LevelUpdate, Selection};
use crate::processor::{PhaseProcessor, ProcessorRegistry};
use crate::telemetry::{EventBus, ListenerId, ProcessingEvent};

use executor::CycleExecutor;

/// Run lifecycle records go to `info!` when the engine is in debug mode.
macro_rules! lifecycle {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

pub struct Engine {
    config: EngineConfig,
    levels: RwLock<LevelRegistry>,
    processors: RwLock<ProcessorRegistry>,
    events: EventBus,
    selector: DimensionSelector,
}

impl Engine {
    /// Engine with default settings and the `STANDARD` level
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let mut levels = LevelRegistry::new(config.min_timeout_ms);
        let standard = &config.default_level;
        let seeded = levels.add(
            &standard.id,
            standard.dimension,
            &standard.phases,
            standard.timeout_ms,
        );
        debug_assert!(seeded, "built-in default level failed validation");
        Self::assemble(config, levels)
    }

    /// Engine seeded from configuration: the default level first, then every
    /// configured level in order.
    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            EngineError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let mut levels = LevelRegistry::new(config.min_timeout_ms);
        for seed in config.seed_levels() {
            if !levels.add(&seed.id, seed.dimension, &seed.phases, seed.timeout_ms) {
                return Err(EngineError::InvalidLevel {
                    level_id: seed.id.clone(),
                    reason: "rejected by level registry".to_string(),
                });
            }
        }
        Ok(Self::assemble(config, levels))
    }

    fn assemble(config: EngineConfig, levels: LevelRegistry) -> Self {
        let selector = DimensionSelector::new(config.max_dimension_distance);
        lifecycle!(
            config.debug,
            levels = levels.len(),
            min_timeout_ms = config.min_timeout_ms,
            "engine initialized"
        );
        Self {
            config,
            levels: RwLock::new(levels),
            processors: RwLock::new(ProcessorRegistry::new()),
            events: EventBus::new(),
            selector,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Levels

    pub fn add_level<S: AsRef<str>>(
        &self,
        level_id: &str,
        dimension: f64,
        phases: &[S],
        timeout_ms: u64,
    ) -> bool {
        self.levels.write().add(level_id, dimension, phases, timeout_ms)
    }

    pub fn remove_level(&self, level_id: &str) -> bool {
        self.levels.write().remove(level_id)
    }

    pub fn edit_level(&self, level_id: &str, update: &LevelUpdate) -> bool {
        self.levels.write().edit(level_id, update)
    }

    pub fn move_level(&self, level_id: &str, position: usize) -> bool {
        self.levels.write().move_to(level_id, position)
    }

    pub fn level_info(&self, level_id: &str) -> Result<LevelInfo, ProcessingError> {
        self.levels.read().info(level_id)
    }

    pub fn all_level_info(&self) -> HashMap<String, LevelInfo> {
        self.levels.read().all_info()
    }

    /// Snapshot of the levels in position order
    pub fn list_levels(&self) -> Vec<Level> {
        self.levels.read().iter().cloned().collect()
    }

    /// Pick the level nearest `dimension`; the first level when absent
    pub fn select_level(&self, dimension: Option<f64>) -> Option<Selection> {
        self.selector.select(self.levels.read().iter(), dimension)
    }

    pub fn determine_active_level(&self, context: &ProcessingContext) -> Option<Selection> {
        self.select_level(Some(context.dimension))
    }

    // Processors

    /// Bind `processor` to the named phase. Returns false for an unknown phase.
    pub fn register_processor<P>(&self, phase: &str, processor: P) -> bool
    where
        P: PhaseProcessor + 'static,
    {
        self.processors.write().register(phase, Arc::new(processor))
    }

    /// Restore the built-in processor for a phase
    pub fn reset_processor(&self, phase: &str) -> bool {
        self.processors.write().reset(phase)
    }

    // Events

    pub fn add_event_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ProcessingEvent<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    // Processing

    /// Run one processing cycle over `input`.
    ///
    /// Invalid input fails with `VALIDATION` before any state is created or
    /// any event is emitted. Every other failure carries the partial context
    /// and is announced by exactly one `processingFailed` event.
    pub async fn process(
        &self,
        input: &Value,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProcessingContext, ProcessingError> {
        let started = Instant::now();
        let fields = validate_input(input)?;
        let mut ctx = initialize_context(fields, self.config.default_dimension);
        let requested = fields.get("dimension").and_then(Value::as_f64);

        let level = {
            let levels = self.levels.read();
            self.selector
                .select(levels.iter(), requested)
                .and_then(|selection| levels.get(&selection.level_id).cloned())
        };
        let Some(level) = level else {
            let error = ProcessingError::level_not_found(
                &self.config.default_level.id,
                self.levels.read().ids(),
            );
            return Err(self.fail(error, ctx));
        };

        lifecycle!(
            self.config.debug,
            level_id = %level.id,
            dimension = ctx.dimension,
            phases = level.phases.len(),
            "processing started"
        );
        self.events.emit(&ProcessingEvent::ProcessingStarted {
            level_id: &level.id,
            context: &ctx,
        });

        let entry_check = match cancel {
            Some(token) => token.throw_if_cancellation_requested(),
            None => Ok(()),
        };
        let outcome = match entry_check {
            Ok(()) => {
                CycleExecutor::new(&self.processors, &self.events)
                    .execute(&level, &mut ctx, cancel)
                    .await
            }
            Err(cancelled) => Err(cancelled),
        };

        match outcome {
            Ok(()) => {
                ctx.processing_journey.completion_state = CompletionState::Complete;
                let duration_ms = started.elapsed().as_millis() as u64;
                lifecycle!(
                    self.config.debug,
                    level_id = %level.id,
                    duration_ms,
                    artifacts = ctx.artifacts.len(),
                    "processing completed"
                );
                self.events.emit(&ProcessingEvent::ProcessingCompleted {
                    result: &ctx,
                    duration_ms,
                });
                Ok(ctx)
            }
            Err(error) => Err(self.fail(error, ctx)),
        }
    }

    /// Record the failure on the journey, announce it, and attach the context.
    fn fail(&self, error: ProcessingError, mut ctx: ProcessingContext) -> ProcessingError {
        let kind = error.kind();
        ctx.processing_journey.completion_state = CompletionState::for_failure(kind);
        ctx.processing_journey.error = Some(JourneyError {
            message: error.message.clone(),
            kind,
        });

        error!(
            error_type = kind.as_str(),
            level_id = error.details.level_id().unwrap_or(""),
            artifacts = ctx.artifacts.len(),
            "processing failed: {}",
            error.message
        );
        self.events.emit(&ProcessingEvent::ProcessingFailed {
            error: &error,
            context: &ctx,
        });
        error.with_context(ctx)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
