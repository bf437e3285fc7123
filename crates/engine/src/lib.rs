//! Job queue orchestration and progress reconciliation engine.
//!
//! [`RunController`] owns the run lifecycle (`idle -> starting ->
//! running -> stopping -> idle`), submits the queue to the execution
//! backend, and is the single point of truth for whether a run is
//! active. While a run is in flight a cancellable poller task fetches
//! progress snapshots and the reconciler merges them into local state,
//! detecting termination and capturing history.

pub mod config;
pub mod controller;
pub mod error;
pub mod history;
mod poller;
pub mod reconciler;
pub mod state;

pub use config::EngineConfig;
pub use controller::RunController;
pub use error::EngineError;
pub use history::HistoryArchive;
pub use state::ControllerState;
