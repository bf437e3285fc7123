//! In-process event bus for engine lifecycle events.
//!
//! UI-facing consumers subscribe here to observe run progress and
//! operator notifications without reaching into engine state.

pub mod bus;

pub use bus::{EngineEvent, EventBus, Severity};
