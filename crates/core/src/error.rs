use crate::types::JobId;

/// Errors raised by queue mutation operations.
///
/// All variants are recovered locally: the queue is left unchanged and
/// the caller surfaces the message to the operator.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// A mutation was attempted while a run is active.
    #[error("Queue is locked while a run is active")]
    Locked,

    /// The referenced job does not exist in the queue.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// The supplied field values are invalid.
    #[error("Validation failed: {0}")]
    Validation(String),
}
