//! REST client for the execution backend's HTTP endpoints.
//!
//! Wraps the backend task API (queue submission, stop/pause/resume,
//! progress and history retrieval) using [`reqwest`].

use async_trait::async_trait;

use jobdeck_core::history::HistoryEntry;

use crate::backend::ExecutionBackend;
use crate::config::BackendConfig;
use crate::wire::{AckReply, ClearReply, ProgressSnapshot, QueuedJob, SubmitReply};

/// HTTP client for a single execution backend.
pub struct BackendApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum BackendApiError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl BackendApi {
    /// Build a client from endpoint configuration.
    ///
    /// The configured request timeout applies to every call made
    /// through this client.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`BackendApiError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BackendApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ExecutionBackend for BackendApi {
    /// Submit the queue for execution via `POST /api/task/start`.
    async fn submit(&self, jobs: &[QueuedJob]) -> Result<SubmitReply, BackendApiError> {
        tracing::debug!(jobs = jobs.len(), "Submitting queue to backend");
        let body = serde_json::json!({ "jobs": jobs });

        let response = self
            .client
            .post(format!("{}/api/task/start", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Stop the active run via `POST /api/task/stop`.
    async fn stop(&self) -> Result<AckReply, BackendApiError> {
        let response = self
            .client
            .post(format!("{}/api/task/stop", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Suspend the active run via `POST /api/task/pause`.
    async fn pause(&self) -> Result<AckReply, BackendApiError> {
        let response = self
            .client
            .post(format!("{}/api/task/pause", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Resume a suspended run via `POST /api/task/resume`.
    async fn resume(&self) -> Result<AckReply, BackendApiError> {
        let response = self
            .client
            .post(format!("{}/api/task/resume", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the progress snapshot via `GET /api/task/status`.
    async fn fetch_progress(&self) -> Result<ProgressSnapshot, BackendApiError> {
        let response = self
            .client
            .get(format!("{}/api/task/status", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch persisted run history via `GET /api/task/history`.
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, BackendApiError> {
        let response = self
            .client
            .get(format!("{}/api/task/history", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Delete persisted run history via `DELETE /api/task/history`.
    async fn clear_history(&self) -> Result<ClearReply, BackendApiError> {
        let response = self
            .client
            .delete(format!("{}/api/task/history", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
