//! The [`Job`] entity: one queued unit of automation work.
//!
//! A job references a backend-side routine, carries a repeat count and
//! an opaque parameter payload, and is classified by a [`JobCategory`]
//! used for display and backend routing.

use serde::{Deserialize, Serialize};

use crate::types::JobId;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Execution status of a single queued job.
///
/// Mutated only by the execution controller and the reconciler; the
/// operator never writes this field directly. At most one job is
/// `Active` at any time, and only while a run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl JobStatus {
    /// Stable string form, matching the wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// JobCategory
// ---------------------------------------------------------------------------

/// Classification of a job, used for display and backend routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    Commission,
    NightSailing,
    CommissionLetter,
}

impl JobCategory {
    /// The routing key sent to the execution backend.
    pub fn wire_key(self) -> &'static str {
        match self {
            JobCategory::Commission => "commission",
            JobCategory::NightSailing => "night_sailing",
            JobCategory::CommissionLetter => "commission_letter",
        }
    }

    /// Lenient classification from shell-provided keys.
    ///
    /// Scans the sub-category key first, then the mission-type key,
    /// accepting any string that contains a known routing key. Unknown
    /// or missing keys fall back to [`JobCategory::Commission`], which
    /// matches how imported queue definitions have always been treated.
    pub fn from_keys(sub_category: Option<&str>, mission_type: Option<&str>) -> Self {
        for key in [sub_category, mission_type].into_iter().flatten() {
            // Longest key first: "commission_letter" contains "commission".
            if key.contains("commission_letter") {
                return JobCategory::CommissionLetter;
            }
            if key.contains("night_sailing") {
                return JobCategory::NightSailing;
            }
            if key.contains("commission") {
                return JobCategory::Commission;
            }
        }
        JobCategory::Commission
    }
}

// ---------------------------------------------------------------------------
// Job / JobDraft
// ---------------------------------------------------------------------------

/// Operator-supplied fields for a job about to be enqueued.
///
/// The queue assigns the id and the initial `Pending` status on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDraft {
    /// Human-readable label, immutable after creation.
    pub name: String,
    pub category: JobCategory,
    /// Free-form sub-classification tag.
    #[serde(default)]
    pub sub_category: Option<String>,
    /// Selected difficulty/level; only meaningful for night-sailing jobs.
    #[serde(default)]
    pub level: Option<String>,
    /// Backend-side routine id; absent for plain jobs.
    #[serde(default)]
    pub routine_ref: Option<String>,
    /// How many times the job repeats. Must be at least 1.
    pub run_count: u32,
    /// Opaque payload forwarded to the backend unmodified.
    #[serde(default = "empty_params")]
    pub params: serde_json::Value,
}

fn empty_params() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

/// One queued unit of automation work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub category: JobCategory,
    pub sub_category: Option<String>,
    pub level: Option<String>,
    pub routine_ref: Option<String>,
    pub run_count: u32,
    pub params: serde_json::Value,
    pub status: JobStatus,
}

impl Job {
    /// Materialize a draft into a job with a fresh id and `Pending` status.
    pub(crate) fn from_draft(draft: JobDraft) -> Self {
        Self {
            id: JobId::new_v4(),
            name: draft.name,
            category: draft.category,
            sub_category: draft.sub_category,
            level: draft.level,
            routine_ref: draft.routine_ref,
            run_count: draft.run_count,
            params: draft.params,
            status: JobStatus::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
