//! Cycle executor: runs a level's phases in order against one context, raced
//! against the level's timeout.

use futures::FutureExt;
use parking_lot::RwLock;
use std::panic::AssertUnwindSafe;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cancellation::CancellationToken;
use crate::context::{Artifact, CurrentPhase, ProcessingContext};
use crate::error::{ErrorDetails, ProcessingError};
use crate::level::Level;
use crate::phase::Phase;
use crate::processor::ProcessorRegistry;
use crate::telemetry::{now_rfc3339, EventBus, ProcessingEvent};

pub(crate) struct CycleExecutor<'a> {
    processors: &'a RwLock<ProcessorRegistry>,
    events: &'a EventBus,
}

impl<'a> CycleExecutor<'a> {
    pub(crate) fn new(processors: &'a RwLock<ProcessorRegistry>, events: &'a EventBus) -> Self {
        Self { processors, events }
    }

    /// Run every phase of `level`, or fail with `TIMEOUT` once the level's
    /// timeout elapses.
    ///
    /// On timeout the in-flight processor future is dropped; artifacts and
    /// status committed by earlier phases stay in `ctx`.
    pub(crate) async fn execute(
        &self,
        level: &Level,
        ctx: &mut ProcessingContext,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), ProcessingError> {
        match tokio::time::timeout(level.timeout(), self.run_phases(level, ctx, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    level_id = %level.id,
                    timeout_ms = level.timeout_ms,
                    "processing timed out"
                );
                Err(ProcessingError::new(
                    format!(
                        "Processing timeout exceeded ({}ms) for level {}",
                        level.timeout_ms, level.id
                    ),
                    ErrorDetails::Timeout {
                        level_id: level.id.clone(),
                        timeout_ms: level.timeout_ms,
                        phases: level.phases.clone(),
                        triggered_at: now_rfc3339(),
                    },
                ))
            }
        }
    }

    async fn run_phases(
        &self,
        level: &Level,
        ctx: &mut ProcessingContext,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), ProcessingError> {
        let total = level.phases.len() as f64;

        for (index, &phase) in level.phases.iter().enumerate() {
            ctx.status.current_phase = CurrentPhase::Running(phase);
            ctx.status.progress = index as f64 / total;
            self.events.emit(&ProcessingEvent::PhaseStarted {
                level_id: &level.id,
                phase,
                context: ctx,
            });

            if let Some(token) = cancel {
                token.throw_if_cancellation_requested()?;
            }

            let phase_started = Instant::now();
            let content = self.invoke(level, phase, ctx, cancel, phase_started).await?;

            ctx.status.completed_phases.push(phase);
            ctx.status.progress = (index + 1) as f64 / total;
            ctx.status.current_phase = CurrentPhase::Idle;
            let artifact = ctx.artifacts.insert(Artifact {
                layer_id: Artifact::layer_key(&level.id, phase),
                timestamp: now_rfc3339(),
                dimension: ctx.dimension,
                content,
            });

            let duration_ms = phase_started.elapsed().as_millis() as u64;
            debug!(
                level_id = %level.id,
                phase = phase.as_str(),
                duration_ms,
                "phase completed"
            );
            self.events.emit(&ProcessingEvent::PhaseCompleted {
                level_id: &level.id,
                phase,
                artifact,
                duration_ms,
            });
        }

        ctx.dimension = level.dimension;
        ctx.status.current_phase = CurrentPhase::Complete;
        ctx.status.progress = 1.0;
        Ok(())
    }

    /// Invoke the processor bound to `phase`, converting errors and panics
    /// into `EXECUTION` failures timed from `phase_started`.
    async fn invoke(
        &self,
        level: &Level,
        phase: Phase,
        ctx: &ProcessingContext,
        cancel: Option<&CancellationToken>,
        phase_started: Instant,
    ) -> Result<serde_json::Value, ProcessingError> {
        let processor = self.processors.read().resolve(phase).ok_or_else(|| {
            execution_error(
                level,
                phase,
                phase_started,
                anyhow::anyhow!("no processor available"),
            )
        })?;

        let failure = match AssertUnwindSafe(processor.process(ctx)).catch_unwind().await {
            Ok(Ok(content)) => return Ok(content),
            Ok(Err(err)) => err,
            Err(panic) => anyhow::anyhow!("processor panicked: {}", panic_message(panic.as_ref())),
        };

        // A failure observed after cancellation was requested is reported as
        // the cancellation.
        if let Some(token) = cancel {
            token.throw_if_cancellation_requested()?;
        }
        Err(execution_error(level, phase, phase_started, failure))
    }
}

fn execution_error(
    level: &Level,
    phase: Phase,
    phase_started: Instant,
    source: anyhow::Error,
) -> ProcessingError {
    debug!(
        level_id = %level.id,
        phase = phase.as_str(),
        error = %source,
        "phase failed"
    );
    ProcessingError::new(
        format!("Error executing {} phase: {}", phase, source),
        ErrorDetails::Execution {
            level_id: level.id.clone(),
            phase: Some(phase),
            elapsed_ms: phase_started.elapsed().as_millis() as u64,
        },
    )
    .with_source(source)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
