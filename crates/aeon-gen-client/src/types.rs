//! Generation backend request/response types.
//!
//! Responses are deserialized leniently (every field optional) and then
//! normalized into the typed domain records; records missing required
//! fields are rejected rather than passed through. Each entry of a
//! response list is decoded on its own, so one mistyped record never
//! fails the whole response.

use std::collections::HashMap;

use aeon_models::{JobState, JobStatus, ModelDescriptor, SceneSpec};
use aeon_planner::{ModelRegistry, PlanResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// One scene as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRequest {
    pub segment_id: String,
    pub prompt_text: String,
    /// Duration in seconds
    pub duration: u32,
    pub model: String,
    pub width: u32,
    pub height: u32,
}

impl From<&SceneSpec> for SceneRequest {
    fn from(spec: &SceneSpec) -> Self {
        Self {
            segment_id: spec.scene_id.to_string(),
            prompt_text: spec.prompt_text.clone(),
            duration: spec.duration_secs,
            model: spec.model_id.clone(),
            width: spec.width,
            height: spec.height,
        }
    }
}

/// Batch launch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchBatchRequest {
    pub scenes: Vec<SceneRequest>,
}

impl LaunchBatchRequest {
    pub fn from_specs(specs: &[SceneSpec]) -> Self {
        Self {
            scenes: specs.iter().map(SceneRequest::from).collect(),
        }
    }
}

/// Per-scene acknowledgement in a launch response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchEntry {
    pub scene_id: Option<String>,
    pub model: Option<String>,
    pub status: Option<String>,
    pub prediction_id: Option<String>,
    pub poll_url: Option<String>,
    pub prompt_used: Option<String>,
    pub duration: Option<u32>,
    pub error: Option<String>,
    pub created_at: Option<String>,
    /// Set when the record could not be decoded; only `scene_id` is kept
    #[serde(skip)]
    pub malformed: bool,
}

impl LaunchEntry {
    fn from_raw(value: Value) -> Self {
        let scene_id = value
            .get("scene_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        match decode(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(scene_id = ?scene_id, "Malformed launch acknowledgement: {}", e);
                Self {
                    scene_id,
                    malformed: true,
                    ..Default::default()
                }
            }
        }
    }
}

fn raw_entries<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_launch_entries<'de, D>(deserializer: D) -> Result<Vec<LaunchEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_entries(deserializer)?
        .into_iter()
        .map(LaunchEntry::from_raw)
        .collect())
}

fn lenient_poll_entries<'de, D>(deserializer: D) -> Result<Vec<PollEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_entries(deserializer)?
        .into_iter()
        .map(PollEntry::from_raw)
        .collect())
}

fn lenient_summary<'de, D>(deserializer: D) -> Result<Option<RemoteSummary>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| {
        decode(value)
            .map_err(|e| warn!("Ignoring malformed status summary: {}", e))
            .ok()
    }))
}

fn decode<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}

/// Batch launch response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchBatchResponse {
    pub status: Option<String>,
    pub total_scenes: Option<usize>,
    pub successful_launches: Option<usize>,
    pub failed_launches: Option<usize>,
    #[serde(default, deserialize_with = "lenient_launch_entries")]
    pub scenes: Vec<LaunchEntry>,
}

/// Aggregated status request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStatusRequest {
    pub poll_urls: Vec<String>,
}

/// Per-job entry in a status response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollEntry {
    pub prediction_id: Option<String>,
    pub status: Option<String>,
    /// String or list of strings
    pub output_url: Option<serde_json::Value>,
    /// Raw provider output, used when `output_url` is absent
    pub output: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
    pub progress: Option<f64>,
    /// Set when the record could not be decoded; only `prediction_id` is kept
    #[serde(skip)]
    pub malformed: bool,
}

impl PollEntry {
    fn from_raw(value: Value) -> Self {
        let prediction_id = value
            .get("prediction_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        match decode(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(job_handle = ?prediction_id, "Malformed status entry: {}", e);
                Self {
                    prediction_id,
                    malformed: true,
                    ..Default::default()
                }
            }
        }
    }

    /// Normalize into a job status; `None` when the record is malformed or
    /// the handle or state is missing.
    pub fn into_job_status(self) -> Option<JobStatus> {
        if self.malformed {
            return None;
        }
        let job_handle = self.prediction_id.filter(|id| !id.trim().is_empty())?;
        let state = JobState::from_remote(self.status.as_deref()?);

        let output_url = self
            .output_url
            .as_ref()
            .and_then(first_url)
            .or_else(|| self.output.as_ref().and_then(first_url));

        let mut error_detail = self.error.as_ref().and_then(error_text);
        if state == JobState::Failed && error_detail.is_none() {
            error_detail = Some("generation failed".to_string());
        }

        Some(JobStatus {
            job_handle,
            state,
            output_url,
            error_detail,
            progress_percent: self.progress,
        })
    }
}

fn first_url(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(first_url),
        _ => None,
    }
}

fn error_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Backend-computed summary of the polled jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteSummary {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub completed: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub in_progress: usize,
    #[serde(default)]
    pub status_breakdown: HashMap<String, usize>,
}

/// Aggregated status response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollStatusResponse {
    #[serde(default, deserialize_with = "lenient_poll_entries")]
    pub scenes: Vec<PollEntry>,
    #[serde(default, deserialize_with = "lenient_summary")]
    pub summary: Option<RemoteSummary>,
}

impl PollStatusResponse {
    /// Jobs the backend considers in flight.
    ///
    /// Uses the backend summary when present, otherwise counts the
    /// non-terminal entries. Malformed entries count as in flight since
    /// their state is unknown.
    pub fn remote_in_flight(&self) -> usize {
        match &self.summary {
            Some(summary) => summary.in_progress,
            None => self
                .scenes
                .iter()
                .filter(|entry| {
                    entry.malformed
                        || entry
                            .status
                            .as_deref()
                            .is_some_and(|status| !JobState::from_remote(status).is_terminal())
                })
                .count(),
        }
    }
}

/// Model as listed in the backend catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogModel {
    pub id: String,
    pub name: String,
    /// Longest supported scene, in seconds
    pub max_duration: u32,
}

/// Backend model catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCatalogResponse {
    #[serde(default)]
    pub fast_models_5s: Vec<CatalogModel>,
    #[serde(default)]
    pub stable_models_10s: Vec<CatalogModel>,
    /// Model id to provider model reference
    #[serde(default)]
    pub model_mapping: HashMap<String, String>,
}

impl ModelCatalogResponse {
    /// Build a registry; fails when a tier is empty or has duplicates.
    pub fn into_registry(self) -> PlanResult<ModelRegistry> {
        let mapping = self.model_mapping;
        let describe = |model: CatalogModel| {
            let descriptor = ModelDescriptor::new(model.id, model.name, model.max_duration);
            match mapping.get(&descriptor.id) {
                Some(version) => descriptor.with_backend_version(version.clone()),
                None => descriptor,
            }
        };

        let short = self.fast_models_5s.into_iter().map(&describe).collect();
        let long = self.stable_models_10s.into_iter().map(&describe).collect();
        ModelRegistry::new(short, long)
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
