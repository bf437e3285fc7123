//! Controller lifecycle states and the transition table.

use serde::Serialize;

/// Lifecycle state of the execution controller.
///
/// `Error` is a transient surfacing state: after the failure has been
/// reported the controller always settles back to `Idle`, so a retryable
/// `start()` is never blocked by a past failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Starting,
    Running,
    Stopping,
    Error,
}

impl ControllerState {
    pub fn as_str(self) -> &'static str {
        match self {
            ControllerState::Idle => "idle",
            ControllerState::Starting => "starting",
            ControllerState::Running => "running",
            ControllerState::Stopping => "stopping",
            ControllerState::Error => "error",
        }
    }

    /// Whether a run currently owns the queue (operator mutation is
    /// rejected in these states).
    pub fn is_run_active(self) -> bool {
        matches!(
            self,
            ControllerState::Starting | ControllerState::Running | ControllerState::Stopping
        )
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the set of states reachable from `from`.
pub fn valid_transitions(from: ControllerState) -> &'static [ControllerState] {
    use ControllerState::*;
    match from {
        Idle => &[Starting],
        Starting => &[Running, Error],
        // Running ends via operator stop, terminal reconciliation, or a
        // forced error (polling exhausted).
        Running => &[Stopping, Idle, Error],
        Stopping => &[Idle, Error],
        Error => &[Idle],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: ControllerState, to: ControllerState) -> bool {
    valid_transitions(from).contains(&to)
}
