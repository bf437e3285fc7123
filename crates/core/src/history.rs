//! Immutable records of finished runs.

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobStatus};
use crate::types::{JobId, RunId, Timestamp};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Failed,
    Stopped,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Failed => "failed",
            RunOutcome::Stopped => "stopped",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, RunOutcome::Failed)
    }
}

/// Identity and final status of one job within a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryJobRecord {
    pub job_id: JobId,
    pub name: String,
    pub status: JobStatus,
}

impl From<&Job> for HistoryJobRecord {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            name: job.name.clone(),
            status: job.status,
        }
    }
}

/// Append-only record of one completed, failed, or stopped run.
///
/// Produced exactly once per run termination and never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub run_id: RunId,
    /// Per-job identity and final status for the queue that ran.
    pub jobs: Vec<HistoryJobRecord>,
    pub outcome: RunOutcome,
    /// Runs finished before the run terminated.
    pub completed_runs: u32,
    /// The denominator recorded at run start.
    pub total_runs: u32,
    /// Backend-reported result payload, plus a failure note when the
    /// run was cut short locally.
    pub detail: serde_json::Value,
    pub started_at: Timestamp,
    /// When the entry was produced (run termination time).
    pub created_at: Timestamp,
    pub duration_ms: i64,
}
