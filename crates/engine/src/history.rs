//! Read-through cache over the backend's persisted run history.

use std::sync::Arc;

use tokio::sync::RwLock;

use jobdeck_client::{BackendApiError, ExecutionBackend};
use jobdeck_core::history::HistoryEntry;

/// Append-only archive of finished runs.
///
/// The backend persists history across sessions; this local copy is a
/// cache kept newest-first. Entries appended locally at run termination
/// survive a [`refresh`](HistoryArchive::refresh) until the backend's
/// copy includes them.
pub struct HistoryArchive {
    backend: Arc<dyn ExecutionBackend>,
    /// Newest-first.
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryArchive {
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            backend,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Record one finished run. No validation beyond the type itself.
    pub async fn append(&self, entry: HistoryEntry) {
        self.entries.write().await.insert(0, entry);
    }

    /// All cached entries, newest first.
    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    /// Replace the cache with the backend's persisted history.
    ///
    /// Locally-appended entries the backend does not know yet are kept
    /// at the front. Returns the number of remote entries fetched; on
    /// transport failure the stale cache is left untouched.
    pub async fn refresh(&self) -> Result<usize, BackendApiError> {
        let remote = self.backend.fetch_history().await?;
        let count = remote.len();

        let mut entries = self.entries.write().await;
        let mut merged: Vec<HistoryEntry> = entries
            .iter()
            .filter(|local| !remote.iter().any(|r| r.run_id == local.run_id))
            .cloned()
            .collect();
        merged.extend(remote);
        *entries = merged;

        Ok(count)
    }

    /// Delete the backend-persisted history, then the local cache.
    ///
    /// Deletion is backend-authoritative: if the backend reports
    /// `success = false` or the request fails, the local cache is left
    /// untouched. Returns whether the history was actually cleared.
    pub async fn clear(&self) -> Result<bool, BackendApiError> {
        let reply = self.backend.clear_history().await?;
        if !reply.success {
            tracing::warn!("Backend declined to clear run history");
            return Ok(false);
        }
        self.entries.write().await.clear();
        Ok(true)
    }
}
