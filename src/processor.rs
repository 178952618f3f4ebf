//! Phase processors
//!
//! A processor turns a read-only view of the processing context into an opaque
//! JSON artifact. Every phase has a built-in default; callers may bind their
//! own processor per phase and later reset it back to the default.

pub mod defaults;

pub use defaults::{AnalysisProcessor, OutputProcessor, TransformProcessor};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::context::ProcessingContext;
use crate::phase::Phase;

/// Unit of work bound to a phase
#[async_trait]
pub trait PhaseProcessor: Send + Sync {
    /// Produce the artifact content for this phase
    async fn process(&self, context: &ProcessingContext) -> anyhow::Result<Value>;
}

/// Adapter for synchronous closures
pub struct FnProcessor<F>(F);

impl<F> FnProcessor<F>
where
    F: Fn(&ProcessingContext) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> PhaseProcessor for FnProcessor<F>
where
    F: Fn(&ProcessingContext) -> anyhow::Result<Value> + Send + Sync,
{
    async fn process(&self, context: &ProcessingContext) -> anyhow::Result<Value> {
        (self.0)(context)
    }
}

/// Per-engine phase bindings
pub struct ProcessorRegistry {
    defaults: HashMap<Phase, Arc<dyn PhaseProcessor>>,
    custom: HashMap<Phase, Arc<dyn PhaseProcessor>>,
}

impl ProcessorRegistry {
    /// Registry holding only the built-in defaults
    pub fn new() -> Self {
        let mut defaults: HashMap<Phase, Arc<dyn PhaseProcessor>> = HashMap::new();
        defaults.insert(Phase::Analysis, Arc::new(AnalysisProcessor));
        defaults.insert(Phase::Processing, Arc::new(TransformProcessor));
        defaults.insert(Phase::Output, Arc::new(OutputProcessor));
        Self {
            defaults,
            custom: HashMap::new(),
        }
    }

    /// Bind a processor to a phase by name, replacing any previous binding.
    /// Returns false for a name outside the phase vocabulary.
    pub fn register(&mut self, phase: &str, processor: Arc<dyn PhaseProcessor>) -> bool {
        match phase.parse::<Phase>() {
            Ok(phase) => {
                self.bind(phase, processor);
                true
            }
            Err(err) => {
                debug!(error = %err, "processor registration refused");
                false
            }
        }
    }

    pub fn bind(&mut self, phase: Phase, processor: Arc<dyn PhaseProcessor>) {
        let replaced = self.custom.insert(phase, processor).is_some();
        debug!(phase = phase.as_str(), replaced, "processor registered");
    }

    /// Drop the custom binding for a phase. Returns false when the name is
    /// unknown or the phase already uses its default.
    pub fn reset(&mut self, phase: &str) -> bool {
        let Ok(phase) = phase.parse::<Phase>() else {
            return false;
        };
        let removed = self.custom.remove(&phase).is_some();
        if removed {
            debug!(phase = phase.as_str(), "processor reset to default");
        }
        removed
    }

    /// Processor for a phase: the custom binding if present, else the default
    pub fn resolve(&self, phase: Phase) -> Option<Arc<dyn PhaseProcessor>> {
        self.custom
            .get(&phase)
            .or_else(|| self.defaults.get(&phase))
            .cloned()
    }

    pub fn is_custom(&self, phase: Phase) -> bool {
        self.custom.contains_key(&phase)
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
