//! Worker configuration.

use std::time::Duration;

use aeon_gen_client::config::DEFAULT_POLL_MAX_ATTEMPTS;
use aeon_gen_client::{GenClientConfig, PollConfig};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Generation backend connection
    pub client: GenClientConfig,
    /// Explicit poll interval; derived from the batch estimate when unset
    pub poll_interval: Option<Duration>,
    /// Poll attempt budget
    pub poll_max_attempts: u32,
    /// Fetch the model catalog from the backend before planning
    pub refresh_model_catalog: bool,
    /// Install the Prometheus recorder
    pub metrics_enabled: bool,
    /// Default output width in pixels
    pub width: u32,
    /// Default output height in pixels
    pub height: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            client: GenClientConfig::default(),
            poll_interval: None,
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            refresh_model_catalog: false,
            metrics_enabled: false,
            width: 576,
            height: 1024,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            client: GenClientConfig::from_env(),
            poll_interval: std::env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis),
            poll_max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POLL_MAX_ATTEMPTS),
            refresh_model_catalog: env_flag("REFRESH_MODEL_CATALOG"),
            metrics_enabled: env_flag("METRICS_ENABLED"),
            width: std::env::var("SCENE_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(576),
            height: std::env::var("SCENE_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),
        }
    }

    /// Poll config for a batch, using `suggested` when no interval is configured.
    pub fn poll_config(&self, suggested: Duration) -> PollConfig {
        PollConfig::new(self.poll_interval.unwrap_or(suggested), self.poll_max_attempts)
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}
