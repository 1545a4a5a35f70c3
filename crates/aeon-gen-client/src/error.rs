//! Generation client error types.

use aeon_models::{BatchSummary, ValidationError};
use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

#[derive(Debug, Error)]
pub enum GenError {
    /// The batch submission failed as a whole; nothing was launched.
    #[error("Launch failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    LaunchBatch { status: Option<u16>, message: String },

    #[error("Generation backend unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GenError {
    pub fn launch_batch(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::LaunchBatch {
            status,
            message: message.into(),
        }
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenError::ServiceUnavailable(_) | GenError::Network(_)
        )
    }

    /// Re-tag any failure of the launch call as a batch launch error.
    pub fn into_launch_error(self) -> Self {
        match self {
            GenError::LaunchBatch { .. } => self,
            other => GenError::launch_batch(None, other.to_string()),
        }
    }
}

impl From<ValidationError> for GenError {
    fn from(err: ValidationError) -> Self {
        GenError::launch_batch(None, format!("malformed batch: {}", err))
    }
}

pub type PollResult<T> = Result<T, PollError>;

/// Terminal failures of the polling loop.
///
/// Each variant carries the last known summary so callers can decide to keep
/// the scenes that did complete.
#[derive(Debug, Error)]
pub enum PollError {
    /// The backend reports nothing in flight while the batch has not converged.
    #[error("Polling stalled after {attempts} attempts: {} of {} scenes unfinished but backend reports none in flight", .summary.in_progress, .summary.total)]
    Stalled { attempts: u32, summary: BatchSummary },

    /// The attempt budget ran out before convergence.
    #[error("Polling timed out after {attempts} attempts with {} scenes still in progress", .summary.in_progress)]
    Timeout { attempts: u32, summary: BatchSummary },

    /// The final poll attempt failed at the transport level.
    #[error("Polling failed on final attempt {attempts}: {source}")]
    Transport {
        attempts: u32,
        summary: BatchSummary,
        #[source]
        source: GenError,
    },
}

impl PollError {
    /// Last known summary.
    pub fn summary(&self) -> &BatchSummary {
        match self {
            PollError::Stalled { summary, .. }
            | PollError::Timeout { summary, .. }
            | PollError::Transport { summary, .. } => summary,
        }
    }

    /// Poll cycles consumed before the error.
    pub fn attempts(&self) -> u32 {
        match self {
            PollError::Stalled { attempts, .. }
            | PollError::Timeout { attempts, .. }
            | PollError::Transport { attempts, .. } => *attempts,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::Stalled { .. } => "stalled",
            PollError::Timeout { .. } => "timeout",
            PollError::Transport { .. } => "transport",
        }
    }
}
