//! Remote job status tracking.
//!
//! A launched scene becomes a remote job identified by its job handle. The
//! poller keeps one `JobStatus` per job and overwrites it with the freshest
//! remote value until the job reaches a terminal state.

use serde::{Deserialize, Serialize};

/// Remote job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted by the backend, not started yet
    #[default]
    Pending,
    /// Generation in progress
    Running,
    /// Output available
    Completed,
    /// Generation failed or was cancelled remotely
    Failed,
}

impl JobState {
    /// Get string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Map a backend status string onto a job state.
    ///
    /// Unknown values are treated as not started.
    pub fn from_remote(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "processing" | "running" => JobState::Running,
            "succeeded" | "completed" => JobState::Completed,
            "failed" | "canceled" | "cancelled" | "error" => JobState::Failed,
            _ => JobState::Pending,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Latest known status of one remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_handle: String,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<f64>,
}

impl JobStatus {
    /// Status of a freshly launched job.
    pub fn pending(job_handle: impl Into<String>) -> Self {
        Self {
            job_handle: job_handle.into(),
            state: JobState::Pending,
            output_url: None,
            error_detail: None,
            progress_percent: None,
        }
    }

    /// Terminal status for a job that never reached the backend.
    pub fn failed(job_handle: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_handle: job_handle.into(),
            state: JobState::Failed,
            output_url: None,
            error_detail: Some(error.into()),
            progress_percent: None,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Overwrite with a fresher remote observation.
    ///
    /// Terminal statuses are sticky: the update is ignored and `false` is
    /// returned. Updates for a different handle are ignored as well.
    pub fn apply(&mut self, update: JobStatus) -> bool {
        if self.is_terminal() || update.job_handle != self.job_handle {
            return false;
        }

        self.state = update.state;
        self.output_url = update.output_url;
        self.error_detail = update.error_detail;
        self.progress_percent = update
            .progress_percent
            .map(|p| p.clamp(0.0, 100.0));
        if self.state == JobState::Completed {
            self.progress_percent = Some(100.0);
        }
        true
    }
}
