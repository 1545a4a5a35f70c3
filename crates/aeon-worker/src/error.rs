//! Worker error types.

use aeon_gen_client::{GenError, PollError};
use aeon_planner::PlanError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("Generation backend error: {0}")]
    Generation(#[from] GenError),

    #[error("{0}")]
    Poll(#[from] PollError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if running the batch again may help.
    ///
    /// Timeouts and transport failures are transient. A stall means the
    /// backend broke its contract, so it is not retried, and neither are bad
    /// input or rejected batches.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Poll(PollError::Stalled { .. }) => false,
            WorkerError::Poll(_) => true,
            WorkerError::Generation(e) => e.is_retryable(),
            WorkerError::Plan(_) | WorkerError::ConfigError(_) => false,
        }
    }
}
