//! Client and polling configuration.

use std::time::Duration;

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4000;

/// Default poll attempt budget (60 x 4s = 4 minutes).
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;

/// Configuration for the generation backend client.
#[derive(Debug, Clone)]
pub struct GenClientConfig {
    /// Base URL of the generation backend
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries for idempotent reads (catalog)
    pub max_retries: u32,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
}

impl Default for GenClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            api_token: None,
        }
    }
}

impl GenClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GENERATION_BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("GENERATION_BACKEND_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("GENERATION_BACKEND_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            api_token: std::env::var("GENERATION_API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

/// Polling cadence and budget for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between poll cycles
    pub interval: Duration,
    /// Maximum number of poll cycles
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            interval: Duration::from_millis(
                std::env::var("POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POLL_MAX_ATTEMPTS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}
