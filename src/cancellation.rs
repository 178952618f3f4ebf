//! Cooperative cancellation.
//!
//! A token is only checked at fixed checkpoints (cycle entry and before each
//! phase); requesting cancellation never interrupts work already in flight.

use crate::error::{ErrorDetails, ProcessingError};
use crate::telemetry::now_rfc3339;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::WaitForCancellationFuture;

struct CancelState {
    signal: tokio_util::sync::CancellationToken,
    requested_at: Mutex<Option<(Instant, String)>>,
}

/// Owner side: creates tokens and requests cancellation.
#[derive(Clone)]
pub struct CancellationTokenSource {
    state: Arc<CancelState>,
}

impl CancellationTokenSource {
    pub fn new() -> Self {
        Self {
            state: Arc::new(CancelState {
                signal: tokio_util::sync::CancellationToken::new(),
                requested_at: Mutex::new(None),
            }),
        }
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            state: Arc::clone(&self.state),
        }
    }

    /// Request cancellation. Repeated calls keep the first request time.
    pub fn cancel(&self) {
        {
            let mut requested_at = self.state.requested_at.lock();
            if requested_at.is_none() {
                *requested_at = Some((Instant::now(), now_rfc3339()));
            }
        }
        self.state.signal.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.signal.is_cancelled()
    }
}

impl Default for CancellationTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side, handed to `Engine::process`.
#[derive(Clone)]
pub struct CancellationToken {
    state: Arc<CancelState>,
}

impl CancellationToken {
    pub fn is_cancellation_requested(&self) -> bool {
        self.state.signal.is_cancelled()
    }

    /// Returns a `CANCELLED` error if cancellation has been requested.
    pub fn throw_if_cancellation_requested(&self) -> Result<(), ProcessingError> {
        if !self.is_cancellation_requested() {
            return Ok(());
        }
        let (cancel_time, elapsed_since_cancellation_ms) = match &*self.state.requested_at.lock()
        {
            Some((at, stamp)) => (Some(stamp.clone()), at.elapsed().as_millis() as u64),
            None => (None, 0),
        };
        Err(ProcessingError::new(
            "Operation was cancelled",
            ErrorDetails::Cancelled {
                cancelled: true,
                cancel_time,
                elapsed_since_cancellation_ms,
            },
        ))
    }

    /// RFC 3339 time of the first cancellation request
    pub fn cancel_time(&self) -> Option<String> {
        self.state
            .requested_at
            .lock()
            .as_ref()
            .map(|(_, stamp)| stamp.clone())
    }

    /// Resolves once cancellation is requested. The engine never awaits
    /// this; it is for callers and processors that want to stop early.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.state.signal.cancelled()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancellation_requested())
            .finish()
    }
}
