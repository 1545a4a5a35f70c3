//! Batch launch.
//!
//! Submits every scene of a batch in one request. Transport or HTTP
//! failure fails the whole batch; otherwise each scene gets exactly one
//! `LaunchResult`, in input order. The launcher never retries.

use std::collections::HashMap;

use aeon_models::{JobState, LaunchReport, LaunchResult, LaunchStatus, SceneSpec};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::backend::GenerationBackend;
use crate::error::{GenError, GenResult};
use crate::metrics::record_launch;
use crate::types::{LaunchBatchRequest, LaunchBatchResponse, LaunchEntry};

const NO_ACK: &str = "no acknowledgement received";
const MISSING_HANDLE: &str = "acknowledgement missing job handle or poll endpoint";
const MALFORMED_ACK: &str = "malformed acknowledgement";

/// Launch all scenes of a batch.
///
/// The batch is validated before anything is sent; an invalid batch or a
/// failed submission returns `GenError::LaunchBatch`.
pub async fn launch_scenes<B>(backend: &B, scenes: &[SceneSpec]) -> GenResult<LaunchReport>
where
    B: GenerationBackend + ?Sized,
{
    SceneSpec::validate_batch(scenes)?;

    let request = LaunchBatchRequest::from_specs(scenes);
    let launched_at = Utc::now();

    let response = backend
        .launch_batch(&request)
        .await
        .map_err(GenError::into_launch_error)?;

    let report = LaunchReport::new(normalize_launch_response(scenes, response, launched_at));
    record_launch(report.successful_launches, report.failed_launches);

    info!(
        total = report.total(),
        successful = report.successful_launches,
        failed = report.failed_launches,
        "Scene batch launched"
    );

    Ok(report)
}

/// Map backend acknowledgements onto the submitted scenes, 1:1 and in order.
///
/// Scenes without an acknowledgement, or whose acknowledgement is malformed
/// or lacks the job handle or poll endpoint, become failed launches. Entries
/// for unknown scenes are ignored.
pub fn normalize_launch_response(
    scenes: &[SceneSpec],
    response: LaunchBatchResponse,
    launched_at: DateTime<Utc>,
) -> Vec<LaunchResult> {
    let mut entries: HashMap<String, LaunchEntry> = HashMap::with_capacity(response.scenes.len());
    for entry in response.scenes {
        let Some(scene_id) = entry.scene_id.clone() else {
            warn!("Ignoring launch acknowledgement without scene_id");
            continue;
        };
        if !scenes.iter().any(|s| s.scene_id.as_str() == scene_id) {
            warn!(scene_id = %scene_id, "Ignoring acknowledgement for unknown scene");
            continue;
        }
        if entries.contains_key(&scene_id) {
            warn!(scene_id = %scene_id, "Ignoring duplicate acknowledgement");
            continue;
        }
        entries.insert(scene_id, entry);
    }

    scenes
        .iter()
        .map(|spec| match entries.remove(spec.scene_id.as_str()) {
            Some(entry) if entry.malformed => failed(spec, MALFORMED_ACK.to_string(), launched_at),
            Some(entry) => from_entry(spec, entry, launched_at),
            None => {
                warn!(scene_id = %spec.scene_id, "{}", NO_ACK);
                failed(spec, NO_ACK.to_string(), launched_at)
            }
        })
        .collect()
}

fn from_entry(spec: &SceneSpec, entry: LaunchEntry, launched_at: DateTime<Utc>) -> LaunchResult {
    let launched_at = entry
        .created_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(launched_at);

    let remote_failed = entry
        .status
        .as_deref()
        .map(|s| JobState::from_remote(s) == JobState::Failed)
        .unwrap_or(false);

    let job_handle = entry.prediction_id.filter(|s| !s.trim().is_empty());
    let poll_endpoint = entry.poll_url.filter(|s| !s.trim().is_empty());

    let status = match (remote_failed, job_handle, poll_endpoint) {
        (false, Some(job_handle), Some(poll_endpoint)) => LaunchStatus::Launched {
            job_handle,
            poll_endpoint,
        },
        (true, _, _) => LaunchStatus::Failed {
            error_detail: entry.error.unwrap_or_else(|| "launch failed".to_string()),
        },
        _ => {
            warn!(scene_id = %spec.scene_id, "{}", MISSING_HANDLE);
            LaunchStatus::Failed {
                error_detail: entry.error.unwrap_or_else(|| MISSING_HANDLE.to_string()),
            }
        }
    };

    LaunchResult {
        scene_id: spec.scene_id.clone(),
        model_id: entry.model.unwrap_or_else(|| spec.model_id.clone()),
        status,
        prompt_used: entry.prompt_used.unwrap_or_else(|| spec.prompt_text.clone()),
        duration_secs: entry.duration.unwrap_or(spec.duration_secs),
        launched_at,
    }
}

fn failed(spec: &SceneSpec, error_detail: String, launched_at: DateTime<Utc>) -> LaunchResult {
    LaunchResult {
        scene_id: spec.scene_id.clone(),
        model_id: spec.model_id.clone(),
        status: LaunchStatus::Failed { error_detail },
        prompt_used: spec.prompt_text.clone(),
        duration_secs: spec.duration_secs,
        launched_at,
    }
}
