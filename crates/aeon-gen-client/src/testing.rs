//! In-memory backend and fixtures for unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use aeon_models::{LaunchReport, LaunchResult, LaunchStatus, SceneId, SceneSpec};
use async_trait::async_trait;
use chrono::Utc;

use crate::backend::GenerationBackend;
use crate::error::{GenError, GenResult};
use crate::types::{
    LaunchBatchRequest, LaunchBatchResponse, LaunchEntry, ModelCatalogResponse, PollEntry,
    PollStatusRequest, PollStatusResponse,
};

/// Scripted poll handler: receives the 1-based poll call number.
pub(crate) type PollScript =
    Box<dyn Fn(u32, &PollStatusRequest) -> GenResult<PollStatusResponse> + Send + Sync>;

/// Backend double with scripted responses and call recording.
pub(crate) struct FakeBackend {
    launch_error: Mutex<Option<GenError>>,
    poll: PollScript,
    catalog: Mutex<Option<GenResult<ModelCatalogResponse>>>,
    launch_calls: AtomicU32,
    poll_calls: AtomicU32,
    poll_requests: Mutex<Vec<PollStatusRequest>>,
}

impl FakeBackend {
    /// Acknowledges every launched scene; polls report all jobs as starting.
    pub(crate) fn acknowledging_all() -> Self {
        Self {
            launch_error: Mutex::new(None),
            poll: Box::new(all_starting),
            catalog: Mutex::new(None),
            launch_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            poll_requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails the next launch call with `error`.
    pub(crate) fn failing_launch(error: GenError) -> Self {
        let backend = Self::acknowledging_all();
        *backend.launch_error.lock().unwrap() = Some(error);
        backend
    }

    /// Answers polls with `script`.
    pub(crate) fn polling<F>(script: F) -> Self
    where
        F: Fn(u32, &PollStatusRequest) -> GenResult<PollStatusResponse> + Send + Sync + 'static,
    {
        Self {
            poll: Box::new(script),
            ..Self::acknowledging_all()
        }
    }

    /// Answers the next catalog fetch with `catalog`.
    pub(crate) fn with_catalog(self, catalog: GenResult<ModelCatalogResponse>) -> Self {
        *self.catalog.lock().unwrap() = Some(catalog);
        self
    }

    pub(crate) fn launch_calls(&self) -> u32 {
        self.launch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_requests(&self) -> Vec<PollStatusRequest> {
        self.poll_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn launch_batch(&self, request: &LaunchBatchRequest) -> GenResult<LaunchBatchResponse> {
        self.launch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.launch_error.lock().unwrap().take() {
            return Err(err);
        }

        let scenes = request
            .scenes
            .iter()
            .map(|scene| LaunchEntry {
                scene_id: Some(scene.segment_id.clone()),
                model: Some(scene.model.clone()),
                status: Some("starting".to_string()),
                prediction_id: Some(format!("pred_{}", scene.segment_id)),
                poll_url: Some(poll_url(&format!("pred_{}", scene.segment_id))),
                prompt_used: Some(scene.prompt_text.clone()),
                duration: Some(scene.duration),
                ..Default::default()
            })
            .collect();

        Ok(LaunchBatchResponse {
            status: Some("success".to_string()),
            scenes,
            ..Default::default()
        })
    }

    async fn poll_status(&self, request: &PollStatusRequest) -> GenResult<PollStatusResponse> {
        let call = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.poll_requests.lock().unwrap().push(request.clone());
        (self.poll)(call, request)
    }

    async fn fetch_catalog(&self) -> GenResult<ModelCatalogResponse> {
        self.catalog
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(GenError::request_failed("catalog not scripted")))
    }
}

fn all_starting(_: u32, request: &PollStatusRequest) -> GenResult<PollStatusResponse> {
    Ok(poll_response(
        request
            .poll_urls
            .iter()
            .map(|url| poll_entry(handle_of(url), "starting"))
            .collect(),
    ))
}

pub(crate) fn poll_url(handle: &str) -> String {
    format!("https://api.replicate.com/v1/predictions/{}", handle)
}

pub(crate) fn handle_of(poll_url: &str) -> &str {
    poll_url.rsplit('/').next().unwrap_or(poll_url)
}

/// `count` valid five-second scenes.
pub(crate) fn specs(count: usize) -> Vec<SceneSpec> {
    (0..count)
        .map(|index| SceneSpec {
            scene_id: SceneId::for_batch(1_700_000_000_000, index),
            prompt_text: format!("A fox in the snow - Scene {} of {}", index + 1, count),
            duration_secs: 5,
            model_id: "minimax".to_string(),
            width: 576,
            height: 1024,
        })
        .collect()
}

pub(crate) fn launch_entry(spec: &SceneSpec, handle: &str) -> LaunchEntry {
    LaunchEntry {
        scene_id: Some(spec.scene_id.to_string()),
        model: Some(spec.model_id.clone()),
        status: Some("starting".to_string()),
        prediction_id: Some(handle.to_string()),
        poll_url: Some(poll_url(handle)),
        prompt_used: Some(spec.prompt_text.clone()),
        duration: Some(spec.duration_secs),
        ..Default::default()
    }
}

/// Report with `launched` scenes handled `p0..` followed by `failed` launch failures.
pub(crate) fn report(launched: usize, failed: usize) -> LaunchReport {
    let results = specs(launched + failed)
        .into_iter()
        .enumerate()
        .map(|(index, spec)| {
            let status = if index < launched {
                let handle = format!("p{}", index);
                LaunchStatus::Launched {
                    poll_endpoint: poll_url(&handle),
                    job_handle: handle,
                }
            } else {
                LaunchStatus::Failed {
                    error_detail: "API error: 422".to_string(),
                }
            };
            LaunchResult {
                scene_id: spec.scene_id,
                model_id: spec.model_id,
                status,
                prompt_used: spec.prompt_text,
                duration_secs: spec.duration_secs,
                launched_at: Utc::now(),
            }
        })
        .collect();
    LaunchReport::new(results)
}

pub(crate) fn poll_entry(handle: &str, status: &str) -> PollEntry {
    PollEntry {
        prediction_id: Some(handle.to_string()),
        status: Some(status.to_string()),
        output_url: (status == "succeeded")
            .then(|| serde_json::Value::String(format!("https://cdn.example.com/{}.mp4", handle))),
        ..Default::default()
    }
}

/// Response without a backend summary; in-flight count comes from the entries.
pub(crate) fn poll_response(scenes: Vec<PollEntry>) -> PollStatusResponse {
    PollStatusResponse {
        scenes,
        summary: None,
    }
}
