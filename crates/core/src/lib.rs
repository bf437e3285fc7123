//! Core data model for the job queue orchestrator.
//!
//! Everything in this crate is pure, synchronous, in-memory state:
//! the [`Job`](job::Job) entity, the operator-facing
//! [`JobQueue`](queue::JobQueue), and the [`HistoryEntry`](history::HistoryEntry)
//! records produced when a run terminates. It has no knowledge of the
//! execution backend or of any transport.

pub mod error;
pub mod history;
pub mod job;
pub mod queue;
pub mod types;
