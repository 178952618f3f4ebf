//! Shared test utilities for integration tests
//!
//! Event recording, scripted processors, and environment isolation for
//! configuration tests.

use async_trait::async_trait;
use multilevel::{Engine, EngineConfig, LevelConfig, PhaseProcessor, ProcessingContext};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Records `eventType[:phase]` labels in delivery order
#[derive(Clone, Default)]
pub struct EventRecorder {
    labels: Arc<Mutex<Vec<String>>>,
}

impl EventRecorder {
    pub fn attach(engine: &Engine) -> Self {
        let recorder = Self::default();
        let sink = Arc::clone(&recorder.labels);
        engine.add_event_listener(move |event| {
            let label = match event.phase() {
                Some(phase) => format!("{}:{}", event.event_type(), phase),
                None => event.event_type().to_string(),
            };
            sink.lock().push(label);
            Ok(())
        });
        recorder
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.labels
            .lock()
            .iter()
            .filter(|label| label.split(':').next() == Some(event_type))
            .count()
    }
}

/// Never resolves
pub struct StalledProcessor;

#[async_trait]
impl PhaseProcessor for StalledProcessor {
    async fn process(&self, _context: &ProcessingContext) -> anyhow::Result<Value> {
        futures::future::pending::<()>().await;
        Ok(Value::Null)
    }
}

/// Sleeps on the tokio clock, then reports how long it slept
pub struct SleepingProcessor(pub Duration);

#[async_trait]
impl PhaseProcessor for SleepingProcessor {
    async fn process(&self, _context: &ProcessingContext) -> anyhow::Result<Value> {
        tokio::time::sleep(self.0).await;
        Ok(json!({ "sleptMs": self.0.as_millis() as u64 }))
    }
}

pub struct FailingProcessor(pub &'static str);

#[async_trait]
impl PhaseProcessor for FailingProcessor {
    async fn process(&self, _context: &ProcessingContext) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!(self.0))
    }
}

pub fn level(id: &str, dimension: f64, phases: &[&str], timeout_ms: u64) -> LevelConfig {
    LevelConfig {
        id: id.to_string(),
        dimension,
        phases: phases.iter().map(|p| p.to_string()).collect(),
        timeout_ms,
    }
}

/// Engine whose only level is `only`
pub fn engine_with_single_level(only: LevelConfig) -> Engine {
    let config = EngineConfig {
        default_level: only,
        ..EngineConfig::default()
    };
    Engine::from_config(config).unwrap()
}

/// Engine with STANDARD plus the given levels, in order
pub fn engine_with_levels(levels: Vec<LevelConfig>) -> Engine {
    let config = EngineConfig {
        levels,
        ..EngineConfig::default()
    };
    Engine::from_config(config).unwrap()
}

/// Global mutex to serialize environment variable access across config tests
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Runs `f` with the given environment variables set, restoring the previous
/// values afterwards.
pub fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}
