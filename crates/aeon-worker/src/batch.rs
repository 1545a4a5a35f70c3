//! One generation batch, end to end.
//!
//! Plans the scenes, launches them in a single request and polls the batch
//! until it converges. Failed scenes are handed back as ready-to-relaunch
//! specs so the caller can retry just those.

use std::sync::Arc;
use std::time::Instant;

use aeon_gen_client::{
    launch_scenes, load_registry, GenerationBackend, PollOutcome, PollProgress,
    ProgressObserver, StatusPoller,
};
use aeon_models::{LaunchReport, SceneSpec};
use aeon_planner::{
    estimate, scenes_for_regeneration, suggested_poll_interval, ModelRegistry, PlanRequest,
    ScenePlanner, TimeEstimate,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::logging::BatchLogger;
use crate::metrics::record_batch_duration;

/// Everything known about a finished batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub estimate: TimeEstimate,
    pub scenes: Vec<SceneSpec>,
    pub launch: LaunchReport,
    pub outcome: PollOutcome,
    /// Specs of the failed scenes
    pub regeneration: Vec<SceneSpec>,
}

/// Runs batches against a generation backend.
pub struct BatchRunner<B> {
    backend: B,
    config: WorkerConfig,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl<B: GenerationBackend> BatchRunner<B> {
    pub fn new(backend: B, config: WorkerConfig) -> Self {
        Self {
            backend,
            config,
            observer: None,
            cancel_rx: None,
        }
    }

    /// Receive progress in addition to the batch log.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Plan, launch and poll one batch.
    pub async fn run(&self, request: &PlanRequest) -> WorkerResult<BatchReport> {
        let registry = if self.config.refresh_model_catalog {
            load_registry(&self.backend).await
        } else {
            ModelRegistry::builtin()
        };

        let scenes = ScenePlanner::new(registry).plan(request)?;
        let batch_id = Uuid::new_v4();
        let logger = BatchLogger::new(&batch_id, scenes.len());
        let span = logger.create_span();

        self.run_planned(batch_id, logger, scenes, request.per_scene_duration_secs)
            .instrument(span)
            .await
    }

    async fn run_planned(
        &self,
        batch_id: Uuid,
        logger: BatchLogger,
        scenes: Vec<SceneSpec>,
        per_scene_duration_secs: u32,
    ) -> WorkerResult<BatchReport> {
        let estimate = estimate(scenes.len() as u32, per_scene_duration_secs);
        logger.log_start(&format!(
            "expected {}s (between {}s and {}s)",
            estimate.average_secs, estimate.min_secs, estimate.max_secs
        ));

        let started_at = Utc::now();
        let started = Instant::now();
        let launch = match launch_scenes(&self.backend, &scenes).await {
            Ok(report) => report,
            Err(e) => {
                logger.log_error(&e.to_string());
                record_batch_duration("launch_failed", started.elapsed());
                return Err(e.into());
            }
        };
        if launch.failed_launches > 0 {
            logger.log_warning(&format!(
                "{} of {} scenes failed to launch",
                launch.failed_launches,
                launch.total()
            ));
        }

        let poll_config = self.config.poll_config(suggested_poll_interval(&estimate));
        let mut poller = StatusPoller::new(&self.backend, poll_config)
            .with_observer(self.progress_observer(&logger));
        if let Some(cancel_rx) = &self.cancel_rx {
            poller = poller.with_cancel(cancel_rx.clone());
        }

        let outcome = match poller.run(&launch).await {
            Ok(outcome) => outcome,
            Err(e) => {
                logger.log_error(&e.to_string());
                record_batch_duration(e.kind(), started.elapsed());
                return Err(e.into());
            }
        };
        record_batch_duration(outcome.state.as_str(), started.elapsed());

        let regeneration = scenes_for_regeneration(&scenes, &outcome.failed_scene_ids());
        logger.log_completion(&format!(
            "{} after {} polls: {} completed, {} failed",
            outcome.state.as_str(),
            outcome.attempts,
            outcome.summary.completed,
            outcome.summary.failed
        ));

        Ok(BatchReport {
            batch_id,
            started_at,
            finished_at: Utc::now(),
            estimate,
            scenes,
            launch,
            outcome,
            regeneration,
        })
    }

    fn progress_observer(&self, logger: &BatchLogger) -> Arc<dyn ProgressObserver> {
        let logger = logger.clone();
        let extra = self.observer.clone();
        Arc::new(move |progress: &PollProgress| {
            logger.log_progress(progress);
            if let Some(extra) = &extra {
                extra.on_progress(progress);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use aeon_gen_client::types::{
        LaunchBatchRequest, LaunchBatchResponse, LaunchEntry, ModelCatalogResponse, PollEntry,
        PollStatusRequest, PollStatusResponse,
    };
    use aeon_gen_client::{GenError, GenResult, PollState};
    use aeon_models::JobState;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::WorkerError;

    /// Acknowledges every scene; jobs for scenes ending in `failing_suffix` fail.
    struct ScriptedBackend {
        failing_suffix: Option<&'static str>,
        launch_calls: AtomicU32,
    }

    impl ScriptedBackend {
        fn new(failing_suffix: Option<&'static str>) -> Self {
            Self {
                failing_suffix,
                launch_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn launch_batch(&self, request: &LaunchBatchRequest) -> GenResult<LaunchBatchResponse> {
            self.launch_calls.fetch_add(1, Ordering::SeqCst);
            let scenes = request
                .scenes
                .iter()
                .map(|scene| LaunchEntry {
                    scene_id: Some(scene.segment_id.clone()),
                    status: Some("starting".to_string()),
                    prediction_id: Some(format!("pred_{}", scene.segment_id)),
                    poll_url: Some(format!("https://backend/predictions/pred_{}", scene.segment_id)),
                    ..Default::default()
                })
                .collect();
            Ok(LaunchBatchResponse {
                scenes,
                ..Default::default()
            })
        }

        async fn poll_status(&self, request: &PollStatusRequest) -> GenResult<PollStatusResponse> {
            let scenes = request
                .poll_urls
                .iter()
                .map(|url| {
                    let handle = url.rsplit('/').next().unwrap_or_default();
                    let failed = self.failing_suffix.is_some_and(|suffix| handle.ends_with(suffix));
                    PollEntry {
                        prediction_id: Some(handle.to_string()),
                        status: Some(if failed { "failed" } else { "succeeded" }.to_string()),
                        output_url: (!failed)
                            .then(|| json!(format!("https://cdn.example.com/{}.mp4", handle))),
                        ..Default::default()
                    }
                })
                .collect();
            Ok(PollStatusResponse {
                scenes,
                summary: None,
            })
        }

        async fn fetch_catalog(&self) -> GenResult<ModelCatalogResponse> {
            serde_json::from_value(json!({
                "fast_models_5s": [{ "id": "kling", "name": "Kling Pro", "max_duration": 10 }],
                "stable_models_10s": [{ "id": "luma", "name": "Luma Dream", "max_duration": 10 }]
            }))
            .map_err(|e| GenError::invalid_response(e.to_string()))
        }
    }

    fn config() -> WorkerConfig {
        WorkerConfig {
            poll_interval: Some(Duration::from_millis(1)),
            poll_max_attempts: 5,
            ..Default::default()
        }
    }

    fn sunset() -> PlanRequest {
        PlanRequest::new("a sunset timelapse", 20, 5, 576, 1024)
    }

    #[tokio::test]
    async fn test_batch_converges() {
        let runner = BatchRunner::new(ScriptedBackend::new(None), config());
        let report = runner.run(&sunset()).await.unwrap();

        assert_eq!(report.scenes.len(), 4);
        assert_eq!(report.estimate.average_secs, 180);
        assert_eq!(report.outcome.state, PollState::Converged);
        assert_eq!(report.outcome.summary.count(JobState::Completed), 4);
        assert!(report.regeneration.is_empty());
    }

    #[tokio::test]
    async fn test_failed_scene_is_offered_for_regeneration() {
        let runner = BatchRunner::new(ScriptedBackend::new(Some("_1")), config());
        let report = runner.run(&sunset()).await.unwrap();

        assert!(report.outcome.summary.is_partial_failure());
        assert_eq!(report.regeneration.len(), 1);
        assert_eq!(report.regeneration[0], report.scenes[1]);
    }

    #[tokio::test]
    async fn test_progress_is_forwarded() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let runner = BatchRunner::new(ScriptedBackend::new(None), config()).with_observer(
            Arc::new(move |p: &PollProgress| sink.lock().unwrap().push(p.attempt)),
        );

        runner.run(&sunset()).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_cancelled_batch() {
        let (_cancel_tx, cancel_rx) = watch::channel(true);
        let runner = BatchRunner::new(ScriptedBackend::new(None), config()).with_cancel(cancel_rx);

        let report = runner.run(&sunset()).await.unwrap();
        assert_eq!(report.outcome.state, PollState::Cancelled);
        assert_eq!(report.outcome.summary.in_progress, 4);
    }

    #[tokio::test]
    async fn test_invalid_request_launches_nothing() {
        let backend = ScriptedBackend::new(None);
        let runner = BatchRunner::new(backend, config());

        let err = runner
            .run(&PlanRequest::new("   ", 20, 5, 576, 1024))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Plan(_)));
        assert_eq!(runner.backend.launch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_catalog_refresh_drives_model_choice() {
        let config = WorkerConfig {
            refresh_model_catalog: true,
            ..config()
        };
        let runner = BatchRunner::new(ScriptedBackend::new(None), config);

        let report = runner.run(&sunset()).await.unwrap();
        assert!(report.scenes.iter().all(|s| s.model_id == "kling"));
    }
}
