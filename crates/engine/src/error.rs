use crate::state::ControllerState;

/// Errors surfaced by the execution controller.
///
/// Precondition failures (`EmptyQueue`, `AlreadyRunning`,
/// `InvalidState`) are returned synchronously with no state change.
/// Backend failures are resolved to a settled controller state before
/// being surfaced.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `start()` was called with no jobs in the queue.
    #[error("Cannot start: the queue is empty")]
    EmptyQueue,

    /// `start()` was called while a run is already active.
    #[error("Cannot start: a run is already active (controller is {0})")]
    AlreadyRunning(ControllerState),

    /// A lifecycle operation was called from a state it is not valid in.
    #[error("{operation} is not valid while the controller is {state}")]
    InvalidState {
        operation: &'static str,
        state: ControllerState,
    },

    /// The backend declined the submitted queue.
    #[error("Backend rejected the queue: {0}")]
    SubmitRejected(String),

    /// A request to the backend failed at the transport layer.
    #[error("Backend request failed: {0}")]
    Transport(String),

    /// Consecutive progress polls failed past the configured threshold.
    #[error("Progress polling exhausted after {failures} consecutive failures")]
    PollingExhausted { failures: u32 },
}
