//! Engine tuning parameters.

use std::time::Duration;

use jobdeck_client::BackendConfig;

/// Default progress poll interval.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of consecutive poll failures tolerated before the run
/// is aborted with a polling-exhausted error.
const DEFAULT_POLL_FAILURE_THRESHOLD: u32 = 5;

/// Tunable parameters for the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixed interval between progress polls.
    pub poll_interval: Duration,
    /// Consecutive poll failures that force the run into `Error`.
    pub poll_failure_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_failure_threshold: DEFAULT_POLL_FAILURE_THRESHOLD,
        }
    }
}

impl From<&BackendConfig> for EngineConfig {
    fn from(config: &BackendConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_failure_threshold: config.poll_failure_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_config_defaults() {
        let from_backend = EngineConfig::from(&BackendConfig::default());
        let defaults = EngineConfig::default();
        assert_eq!(from_backend.poll_interval, defaults.poll_interval);
        assert_eq!(
            from_backend.poll_failure_threshold,
            defaults.poll_failure_threshold
        );
    }
}
