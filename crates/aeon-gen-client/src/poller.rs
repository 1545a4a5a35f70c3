//! Batch status polling.
//!
//! The poller owns the job statuses of one batch. Each cycle queries every
//! non-terminal job in a single request, merges the answers, recomputes the
//! summary and notifies the observer. The loop ends when every scene is
//! terminal (converged), when the backend reports nothing in flight for an
//! unfinished batch (stalled), when the attempt budget is spent (timeout) or
//! when the caller cancels.

use std::collections::HashMap;
use std::sync::Arc;

use aeon_models::{BatchSummary, JobState, JobStatus, LaunchReport, LaunchStatus, SceneId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::GenerationBackend;
use crate::config::PollConfig;
use crate::error::{PollError, PollResult};
use crate::metrics::{record_batch_outcome, record_poll_cycle};
use crate::progress::{PollProgress, ProgressObserver};
use crate::types::{PollStatusRequest, PollStatusResponse};

/// How a polling run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Every scene reached a terminal state
    Converged,
    /// The caller cancelled; statuses are the last observed ones
    Cancelled,
}

impl PollState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollState::Converged => "converged",
            PollState::Cancelled => "cancelled",
        }
    }
}

/// Final status of one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneOutcome {
    pub scene_id: SceneId,
    pub model_id: String,
    pub status: JobStatus,
}

/// Result of a polling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOutcome {
    pub state: PollState,
    pub summary: BatchSummary,
    /// Scenes in launch order
    pub scenes: Vec<SceneOutcome>,
    /// Poll cycles performed
    pub attempts: u32,
}

impl PollOutcome {
    pub fn is_converged(&self) -> bool {
        self.state == PollState::Converged
    }

    /// Scenes that failed at launch or during generation.
    pub fn failed_scene_ids(&self) -> Vec<SceneId> {
        self.scenes
            .iter()
            .filter(|s| s.status.state == JobState::Failed)
            .map(|s| s.scene_id.clone())
            .collect()
    }

    /// Output URLs of completed scenes, in launch order.
    pub fn completed_outputs(&self) -> Vec<(&SceneId, &str)> {
        self.scenes
            .iter()
            .filter(|s| s.status.state == JobState::Completed)
            .filter_map(|s| s.status.output_url.as_deref().map(|url| (&s.scene_id, url)))
            .collect()
    }
}

struct TrackedScene {
    scene_id: SceneId,
    model_id: String,
    poll_endpoint: Option<String>,
    status: JobStatus,
}

/// Job statuses of one batch, keyed by job handle.
struct BatchTracker {
    scenes: Vec<TrackedScene>,
    by_handle: HashMap<String, usize>,
}

impl BatchTracker {
    fn from_report(report: &LaunchReport) -> Self {
        let mut scenes = Vec::with_capacity(report.total());
        let mut by_handle = HashMap::with_capacity(report.successful_launches);

        for result in &report.results {
            let (poll_endpoint, status) = match &result.status {
                LaunchStatus::Launched {
                    job_handle,
                    poll_endpoint,
                } if !by_handle.contains_key(job_handle) => {
                    by_handle.insert(job_handle.clone(), scenes.len());
                    (Some(poll_endpoint.clone()), JobStatus::pending(job_handle.clone()))
                }
                LaunchStatus::Launched { job_handle, .. } => {
                    warn!(
                        scene_id = %result.scene_id,
                        job_handle = %job_handle,
                        "Job handle already used by another scene"
                    );
                    (
                        None,
                        JobStatus::failed(result.scene_id.as_str(), "duplicate job handle"),
                    )
                }
                // Never polled; the scene id stands in for the missing handle.
                LaunchStatus::Failed { error_detail } => (
                    None,
                    JobStatus::failed(result.scene_id.as_str(), error_detail.clone()),
                ),
            };

            scenes.push(TrackedScene {
                scene_id: result.scene_id.clone(),
                model_id: result.model_id.clone(),
                poll_endpoint,
                status,
            });
        }

        Self { scenes, by_handle }
    }

    /// Poll endpoints of jobs that are not terminal yet.
    fn outstanding_endpoints(&self) -> Vec<String> {
        self.scenes
            .iter()
            .filter(|s| !s.status.is_terminal())
            .filter_map(|s| s.poll_endpoint.clone())
            .collect()
    }

    /// Merge a status response; returns the number of state changes.
    fn merge(&mut self, response: PollStatusResponse) -> usize {
        let mut changed = 0;
        for entry in response.scenes {
            let Some(update) = entry.into_job_status() else {
                debug!("Skipping incomplete status entry");
                continue;
            };
            let Some(&index) = self.by_handle.get(&update.job_handle) else {
                debug!(job_handle = %update.job_handle, "Skipping status for unknown job");
                continue;
            };

            let scene = &mut self.scenes[index];
            let previous = scene.status.state;
            if scene.status.apply(update) && scene.status.state != previous {
                changed += 1;
                debug!(
                    scene_id = %scene.scene_id,
                    from = previous.as_str(),
                    to = scene.status.state.as_str(),
                    "Scene state changed"
                );
            }
        }
        changed
    }

    fn summary(&self) -> BatchSummary {
        BatchSummary::from_states(self.scenes.iter().map(|s| s.status.state))
    }

    fn finish(self, state: PollState, summary: BatchSummary, attempts: u32) -> PollOutcome {
        PollOutcome {
            state,
            summary,
            scenes: self
                .scenes
                .into_iter()
                .map(|s| SceneOutcome {
                    scene_id: s.scene_id,
                    model_id: s.model_id,
                    status: s.status,
                })
                .collect(),
            attempts,
        }
    }
}

/// Polls a launched batch until it converges.
pub struct StatusPoller<'a> {
    backend: &'a dyn GenerationBackend,
    config: PollConfig,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl<'a> StatusPoller<'a> {
    pub fn new(backend: &'a dyn GenerationBackend, config: PollConfig) -> Self {
        Self {
            backend,
            config,
            observer: None,
            cancel_rx: None,
        }
    }

    /// Set the progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Poll every launched scene of `report` to a terminal state.
    ///
    /// Scenes that failed at launch count as terminal from the start. A
    /// transport error consumes an attempt; only an error on the final
    /// attempt ends the run.
    pub async fn run(&self, report: &LaunchReport) -> PollResult<PollOutcome> {
        let mut tracker = BatchTracker::from_report(report);
        let mut summary = tracker.summary();
        let mut cancel_rx = self.cancel_rx.clone();

        if summary.is_converged() {
            info!(
                total = summary.total,
                failed = summary.failed,
                "Nothing to poll, batch already terminal"
            );
            self.notify(0, &summary);
            record_batch_outcome(PollState::Converged.as_str());
            return Ok(tracker.finish(PollState::Converged, summary, 0));
        }

        let max_attempts = self.config.max_attempts;
        for attempt in 1..=max_attempts {
            if is_cancelled(&cancel_rx) {
                return Ok(self.cancelled(tracker, summary, attempt - 1));
            }

            let request = PollStatusRequest {
                poll_urls: tracker.outstanding_endpoints(),
            };

            match self.backend.poll_status(&request).await {
                Ok(response) => {
                    record_poll_cycle("ok");
                    let remote_in_flight = response.remote_in_flight();
                    tracker.merge(response);
                    summary = tracker.summary();

                    debug!(
                        attempt,
                        completed = summary.completed,
                        failed = summary.failed,
                        in_progress = summary.in_progress,
                        remote_in_flight,
                        "Poll cycle complete"
                    );
                    self.notify(attempt, &summary);

                    if summary.is_converged() {
                        info!(
                            attempts = attempt,
                            completed = summary.completed,
                            failed = summary.failed,
                            "Batch converged"
                        );
                        record_batch_outcome(PollState::Converged.as_str());
                        return Ok(tracker.finish(PollState::Converged, summary, attempt));
                    }

                    if remote_in_flight == 0 {
                        warn!(
                            attempts = attempt,
                            in_progress = summary.in_progress,
                            "Backend reports no jobs in flight for an unfinished batch"
                        );
                        let err = PollError::Stalled {
                            attempts: attempt,
                            summary,
                        };
                        record_batch_outcome(err.kind());
                        return Err(err);
                    }
                }
                Err(source) if attempt == max_attempts => {
                    record_poll_cycle("transport_error");
                    let err = PollError::Transport {
                        attempts: attempt,
                        summary,
                        source,
                    };
                    warn!("{}", err);
                    record_batch_outcome(err.kind());
                    return Err(err);
                }
                Err(e) => {
                    record_poll_cycle("transport_error");
                    warn!(attempt, "Poll attempt failed, will retry: {}", e);
                }
            }

            if attempt < max_attempts && self.sleep(&mut cancel_rx).await {
                return Ok(self.cancelled(tracker, summary, attempt));
            }
        }

        warn!(
            attempts = max_attempts,
            in_progress = summary.in_progress,
            "Polling budget exhausted"
        );
        let err = PollError::Timeout {
            attempts: max_attempts,
            summary,
        };
        record_batch_outcome(err.kind());
        Err(err)
    }

    fn notify(&self, attempt: u32, summary: &BatchSummary) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&PollProgress {
                attempt,
                summary: summary.clone(),
            });
        }
    }

    fn cancelled(&self, tracker: BatchTracker, summary: BatchSummary, attempts: u32) -> PollOutcome {
        info!(attempts, in_progress = summary.in_progress, "Polling cancelled");
        record_batch_outcome(PollState::Cancelled.as_str());
        tracker.finish(PollState::Cancelled, summary, attempts)
    }

    /// Sleep one interval; returns true when cancelled meanwhile.
    async fn sleep(&self, cancel_rx: &mut Option<watch::Receiver<bool>>) -> bool {
        let Some(rx) = cancel_rx else {
            tokio::time::sleep(self.config.interval).await;
            return false;
        };

        let sleep = tokio::time::sleep(self.config.interval);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = rx.changed() => match changed {
                    Ok(()) if *rx.borrow() => return true,
                    Ok(()) => continue,
                    // Sender dropped: cancellation can no longer arrive.
                    Err(_) => {
                        (&mut sleep).await;
                        return false;
                    }
                },
            }
        }
    }
}

fn is_cancelled(cancel_rx: &Option<watch::Receiver<bool>>) -> bool {
    cancel_rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
}
