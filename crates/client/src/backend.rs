//! The request/response seam between the engine and the execution
//! backend.
//!
//! The engine drives everything through [`ExecutionBackend`] so the
//! orchestration logic can be exercised against test doubles without a
//! live backend. [`BackendApi`](crate::api::BackendApi) is the
//! production implementation.

use async_trait::async_trait;

use jobdeck_core::history::HistoryEntry;

use crate::api::BackendApiError;
use crate::wire::{AckReply, ClearReply, ProgressSnapshot, QueuedJob, SubmitReply};

/// Abstract request/response contract with the execution backend.
///
/// All requests are bounded by the configured timeout; a timed-out
/// request surfaces as a [`BackendApiError`] like any other transport
/// failure.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Submit the full ordered queue, starting backend-side execution.
    async fn submit(&self, jobs: &[QueuedJob]) -> Result<SubmitReply, BackendApiError>;

    /// Ask the backend to stop the active run. Best-effort.
    async fn stop(&self) -> Result<AckReply, BackendApiError>;

    /// Ask the backend to suspend the active run. Optional capability.
    async fn pause(&self) -> Result<AckReply, BackendApiError>;

    /// Ask the backend to resume a suspended run. Optional capability.
    async fn resume(&self) -> Result<AckReply, BackendApiError>;

    /// Fetch the current progress snapshot for the active run.
    async fn fetch_progress(&self) -> Result<ProgressSnapshot, BackendApiError>;

    /// Fetch the backend-persisted run history, newest first.
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, BackendApiError>;

    /// Delete the backend-persisted run history.
    async fn clear_history(&self) -> Result<ClearReply, BackendApiError>;
}
