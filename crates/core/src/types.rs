//! Shared identifier and timestamp aliases.

/// Jobs are identified by a locally-generated UUID v4, assigned at
/// insertion time and immutable afterwards.
pub type JobId = uuid::Uuid;

/// Each run of the queue gets its own UUID v4, used to correlate
/// progress snapshots and history entries.
pub type RunId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
