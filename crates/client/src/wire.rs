//! Typed payloads exchanged with the execution backend.
//!
//! The backend speaks JSON over HTTP. This module owns the request and
//! response shapes plus the status-label vocabulary shared between the
//! backend and the engine's reconciler.

use serde::{Deserialize, Serialize};

use jobdeck_core::job::Job;
use jobdeck_core::types::JobId;

// ---------------------------------------------------------------------------
// Status labels
// ---------------------------------------------------------------------------

/// Status-label vocabulary reported in progress snapshots.
///
/// The backend is free to report richer free-text phases; only the
/// labels listed here carry meaning for the engine.
pub mod labels {
    /// No run has started since the controller went idle.
    pub const IDLE: &str = "idle";
    /// Submit accepted, backend is setting up.
    pub const PREPARING: &str = "preparing";
    pub const RUNNING: &str = "running";
    pub const PAUSED: &str = "paused";
    /// Frozen locally when the operator stops a run.
    pub const STOPPED: &str = "stopped";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";

    /// Labels that end a run.
    pub const TERMINAL: &[&str] = &[COMPLETED, FAILED];

    /// Whether a backend-reported label ends the run.
    pub fn is_terminal(label: &str) -> bool {
        TERMINAL.contains(&label)
    }
}

// ---------------------------------------------------------------------------
// Progress snapshot
// ---------------------------------------------------------------------------

/// The latest backend-reported execution status for the active run.
///
/// Replaced wholesale by polled values while a run is active and frozen
/// at its terminal value when the run ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Runs completed so far; non-decreasing within one run.
    pub current: u32,
    /// Expected run total, fixed for the duration of a run.
    pub total: u32,
    /// Backend-side phase tag; see [`labels`].
    #[serde(rename = "status")]
    pub status_label: String,
    /// Authoritative backend signal that execution is still active.
    pub is_running: bool,
}

impl ProgressSnapshot {
    /// The snapshot held while no run is active.
    pub fn idle() -> Self {
        Self {
            current: 0,
            total: 0,
            status_label: labels::IDLE.to_string(),
            is_running: false,
        }
    }

    /// The optimistic snapshot installed when a run is submitted.
    pub fn preparing(total: u32) -> Self {
        Self {
            current: 0,
            total,
            status_label: labels::PREPARING.to_string(),
            is_running: true,
        }
    }

    /// Terminal when the label is terminal or the backend reports
    /// execution stopped.
    pub fn is_terminal(&self) -> bool {
        labels::is_terminal(&self.status_label) || !self.is_running
    }
}

// ---------------------------------------------------------------------------
// Requests / replies
// ---------------------------------------------------------------------------

/// One job as submitted to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: JobId,
    pub name: String,
    /// Routing key, see [`JobCategory::wire_key`](jobdeck_core::job::JobCategory::wire_key).
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub routine_ref: Option<String>,
    pub run_count: u32,
    pub params: serde_json::Value,
}

impl From<&Job> for QueuedJob {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            name: job.name.clone(),
            category: job.category.wire_key().to_string(),
            sub_category: job.sub_category.clone(),
            level: job.level.clone(),
            routine_ref: job.routine_ref.clone(),
            run_count: job.run_count,
            params: job.params.clone(),
        }
    }
}

/// Reply to a queue submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReply {
    pub accepted: bool,
    /// Backend-provided detail, present on rejection.
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to stop/pause/resume requests. Best-effort: the engine settles
/// local state whether or not the backend acknowledges.
#[derive(Debug, Clone, Deserialize)]
pub struct AckReply {
    pub acknowledged: bool,
}

/// Reply to a history deletion request.
#[derive(Debug, Clone, Deserialize)]
pub struct ClearReply {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
