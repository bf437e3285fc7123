//! HTTP client for the automation execution backend.
//!
//! Provides the [`ExecutionBackend`](backend::ExecutionBackend) seam the
//! engine drives, the typed wire payloads exchanged with the backend,
//! endpoint configuration, and the [`reqwest`]-based implementation.

pub mod api;
pub mod backend;
pub mod config;
pub mod wire;

pub use api::{BackendApi, BackendApiError};
pub use backend::ExecutionBackend;
pub use config::BackendConfig;
pub use wire::{labels, AckReply, ClearReply, ProgressSnapshot, QueuedJob, SubmitReply};
