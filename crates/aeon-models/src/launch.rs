//! Per-scene launch results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SceneId;

/// Outcome of launching one scene.
///
/// The job handle and poll endpoint exist only for launched scenes, the
/// error detail only for failed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "launch_status", rename_all = "snake_case")]
pub enum LaunchStatus {
    Launched {
        job_handle: String,
        poll_endpoint: String,
    },
    Failed {
        error_detail: String,
    },
}

/// Fact recorded when a scene was submitted. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResult {
    pub scene_id: SceneId,
    pub model_id: String,
    #[serde(flatten)]
    pub status: LaunchStatus,
    pub prompt_used: String,
    pub duration_secs: u32,
    pub launched_at: DateTime<Utc>,
}

impl LaunchResult {
    pub fn is_launched(&self) -> bool {
        matches!(self.status, LaunchStatus::Launched { .. })
    }

    /// Job handle, if the scene was launched.
    pub fn job_handle(&self) -> Option<&str> {
        match &self.status {
            LaunchStatus::Launched { job_handle, .. } => Some(job_handle),
            LaunchStatus::Failed { .. } => None,
        }
    }

    /// Poll endpoint, if the scene was launched.
    pub fn poll_endpoint(&self) -> Option<&str> {
        match &self.status {
            LaunchStatus::Launched { poll_endpoint, .. } => Some(poll_endpoint),
            LaunchStatus::Failed { .. } => None,
        }
    }

    /// Launch error, if the scene failed to launch.
    pub fn error_detail(&self) -> Option<&str> {
        match &self.status {
            LaunchStatus::Launched { .. } => None,
            LaunchStatus::Failed { error_detail } => Some(error_detail),
        }
    }
}

/// All launch results of a batch, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchReport {
    pub results: Vec<LaunchResult>,
    pub successful_launches: usize,
    pub failed_launches: usize,
}

impl LaunchReport {
    pub fn new(results: Vec<LaunchResult>) -> Self {
        let successful_launches = results.iter().filter(|r| r.is_launched()).count();
        let failed_launches = results.len() - successful_launches;
        Self {
            results,
            successful_launches,
            failed_launches,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True when no scene could be launched.
    pub fn all_failed(&self) -> bool {
        self.successful_launches == 0
    }
}
