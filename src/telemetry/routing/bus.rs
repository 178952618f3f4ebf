//! In-process event bus: ordered, synchronous fan-out to listeners.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::telemetry::events::ProcessingEvent;
use crate::telemetry::types::ListenerId;

/// Listener callback. An `Err` (or a panic) is logged and does not stop
/// delivery to the remaining listeners.
pub type EventListener = Arc<dyn Fn(&ProcessingEvent<'_>) -> anyhow::Result<()> + Send + Sync>;

pub struct EventBus {
    listeners: RwLock<Vec<(ListenerId, EventListener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ProcessingEvent<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId::next(&self.next_id);
        let mut listeners = self.listeners.write();
        listeners.push((id, Arc::new(listener)));
        debug!(
            listener_id = id.as_u64(),
            total = listeners.len(),
            "event listener added"
        );
        id
    }

    /// Returns false when the id is not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        let removed = listeners.len() != before;
        if removed {
            debug!(
                listener_id = id.as_u64(),
                total = listeners.len(),
                "event listener removed"
            );
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver an event to every listener in registration order.
    ///
    /// The listener list is snapshotted first so listeners may add or remove
    /// listeners while handling an event. Returns how many listeners failed.
    pub fn emit(&self, event: &ProcessingEvent<'_>) -> usize {
        let snapshot: Vec<(ListenerId, EventListener)> = self.listeners.read().clone();
        debug!(
            event_type = event.event_type(),
            listeners = snapshot.len(),
            payload = %event.summary(),
            "emitting processing event"
        );

        let mut failures = 0usize;
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    warn!(
                        listener_id = id.as_u64(),
                        event_type = event.event_type(),
                        error = %err,
                        "error in event listener"
                    );
                }
                Err(panic) => {
                    failures += 1;
                    error!(
                        listener_id = id.as_u64(),
                        event_type = event.event_type(),
                        panic = %panic_message(panic.as_ref()),
                        "event listener panicked"
                    );
                }
            }
        }
        failures
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
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
