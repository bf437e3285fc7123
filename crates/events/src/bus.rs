//! Broadcast event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`EngineEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the engine and any
//! number of read-only observers (UI bridges, log sinks).

use serde::Serialize;
use tokio::sync::broadcast;

use jobdeck_core::types::RunId;

// ---------------------------------------------------------------------------
// EngineEvent
// ---------------------------------------------------------------------------

/// Notification severity for operator-visible messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A lifecycle event emitted by the execution engine.
#[derive(Debug, Clone, Serialize)]
pub enum EngineEvent {
    /// The backend accepted the queue and a run is now in flight.
    RunStarted { run_id: RunId, total_runs: u32 },

    /// A reconciled progress snapshot changed the local state.
    ProgressUpdated {
        run_id: RunId,
        current: u32,
        total: u32,
        status_label: String,
    },

    /// The run reached a successful terminal state.
    RunCompleted { run_id: RunId, completed_runs: u32 },

    /// The run reached a failed terminal state.
    RunFailed { run_id: RunId, error: String },

    /// The operator stopped the run; local state has settled.
    RunStopped { run_id: RunId },

    /// An operator-visible message (errors and warnings surfaced
    /// asynchronously by the engine).
    Notice { severity: Severity, message: String },
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`EngineEvent`].
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: EngineEvent) {
        // A SendError here only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
