/// Backend connection settings loaded from environment variables.
///
/// All fields have defaults suitable for a locally-running backend.
/// The surrounding shell is expected to load any `.env` file before
/// constructing the engine.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend host (default: `127.0.0.1`).
    pub host: String,
    /// Backend port (default: `8000`).
    pub port: u16,
    /// Per-request timeout in seconds (default: `10`). Applies to every
    /// request: submit, stop, pause, resume, progress, history.
    pub request_timeout_secs: u64,
    /// Progress poll interval in milliseconds (default: `1000`).
    pub poll_interval_ms: u64,
    /// Consecutive poll failures tolerated before the run is aborted
    /// (default: `5`).
    pub poll_failure_threshold: u32,
}

impl BackendConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default     |
    /// |--------------------------|-------------|
    /// | `BACKEND_HOST`           | `127.0.0.1` |
    /// | `BACKEND_PORT`           | `8000`      |
    /// | `REQUEST_TIMEOUT_SECS`   | `10`        |
    /// | `POLL_INTERVAL_MS`       | `1000`      |
    /// | `POLL_FAILURE_THRESHOLD` | `5`         |
    pub fn from_env() -> Self {
        let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = std::env::var("BACKEND_PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("BACKEND_PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("POLL_INTERVAL_MS must be a valid u64");

        let poll_failure_threshold: u32 = std::env::var("POLL_FAILURE_THRESHOLD")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_FAILURE_THRESHOLD must be a valid u32");

        Self {
            host,
            port,
            request_timeout_secs,
            poll_interval_ms,
            poll_failure_threshold,
        }
    }

    /// Base HTTP URL for the backend, e.g. `http://127.0.0.1:8000`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            request_timeout_secs: 10,
            poll_interval_ms: 1000,
            poll_failure_threshold: 5,
        }
    }
}
