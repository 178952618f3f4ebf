//! Telemetry domain: lifecycle events and their synchronous fan-out.

mod types;

pub mod events;
pub mod routing;

pub use events::ProcessingEvent;
pub use routing::bus::{EventBus, EventListener};
pub use types::{now_millis, now_rfc3339, ListenerId};
