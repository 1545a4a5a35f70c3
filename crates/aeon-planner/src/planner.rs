//! Scene planning.
//!
//! Splits a requested total duration into fixed-length scenes. The scene
//! count is `ceil(total / per_scene)`; the last scene keeps the full nominal
//! length even when the total does not divide evenly, and the backend trims.

use std::collections::HashSet;

use aeon_models::scene::MAX_SCENES_PER_BATCH;
use aeon_models::{SceneId, SceneSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PlanError, PlanResult};
use crate::registry::ModelRegistry;

/// Input of one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub base_prompt: String,
    pub total_duration_secs: u32,
    pub per_scene_duration_secs: u32,
    pub width: u32,
    pub height: u32,
}

impl PlanRequest {
    pub fn new(
        base_prompt: impl Into<String>,
        total_duration_secs: u32,
        per_scene_duration_secs: u32,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            base_prompt: base_prompt.into(),
            total_duration_secs,
            per_scene_duration_secs,
            width,
            height,
        }
    }

    /// Number of scenes this request produces.
    ///
    /// Fails when the count exceeds what one batch may carry.
    pub fn scene_count(&self) -> PlanResult<usize> {
        if self.total_duration_secs == 0 {
            return Err(PlanError::invalid_input("total duration must be positive"));
        }
        if self.per_scene_duration_secs == 0 {
            return Err(PlanError::invalid_input("scene duration must be positive"));
        }
        let count = self.total_duration_secs.div_ceil(self.per_scene_duration_secs) as usize;
        if count > MAX_SCENES_PER_BATCH {
            return Err(PlanError::invalid_input(format!(
                "{}s in {}s scenes needs {} scenes, batch limit is {}",
                self.total_duration_secs, self.per_scene_duration_secs, count, MAX_SCENES_PER_BATCH
            )));
        }
        Ok(count)
    }
}

/// Plans scene batches against a model registry.
#[derive(Debug, Clone)]
pub struct ScenePlanner {
    registry: ModelRegistry,
}

impl ScenePlanner {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Plan a batch stamped with the current time.
    pub fn plan(&self, request: &PlanRequest) -> PlanResult<Vec<SceneSpec>> {
        self.plan_at(request, Utc::now())
    }

    /// Plan a batch with an explicit batch timestamp.
    ///
    /// Deterministic for a given request and timestamp.
    pub fn plan_at(&self, request: &PlanRequest, batch_started_at: DateTime<Utc>) -> PlanResult<Vec<SceneSpec>> {
        let base_prompt = request.base_prompt.trim();
        if base_prompt.is_empty() {
            return Err(PlanError::invalid_input("base prompt is empty"));
        }

        let scene_count = request.scene_count()?;
        let duration = request.per_scene_duration_secs;
        let batch_ts = batch_started_at.timestamp_millis();

        if request.total_duration_secs % duration != 0 {
            debug!(
                total = request.total_duration_secs,
                per_scene = duration,
                "Total duration not divisible by scene length, last scene keeps nominal length"
            );
        }

        let scenes: Vec<SceneSpec> = (0..scene_count)
            .map(|index| {
                let model_id = self.registry.select_model_for_scene(index, duration);
                if let Some(model) = self.registry.lookup(model_id) {
                    if !model.supports_duration(duration) {
                        warn!(
                            model_id,
                            duration,
                            max = model.max_scene_duration_secs,
                            "Scene longer than model maximum"
                        );
                    }
                }

                SceneSpec {
                    scene_id: SceneId::for_batch(batch_ts, index),
                    prompt_text: format!("{} - Scene {} of {}", base_prompt, index + 1, scene_count),
                    duration_secs: duration,
                    model_id: model_id.to_string(),
                    width: request.width,
                    height: request.height,
                }
            })
            .collect();

        debug!(scene_count, batch_ts, "Planned scene batch");
        Ok(scenes)
    }
}

impl Default for ScenePlanner {
    fn default() -> Self {
        Self::new(ModelRegistry::builtin())
    }
}

/// Plan a batch with the given registry, stamped with the current time.
pub fn create_scene_inputs(
    registry: &ModelRegistry,
    base_prompt: &str,
    total_duration_secs: u32,
    per_scene_duration_secs: u32,
    width: u32,
    height: u32,
) -> PlanResult<Vec<SceneSpec>> {
    let request = PlanRequest::new(base_prompt, total_duration_secs, per_scene_duration_secs, width, height);
    ScenePlanner::new(registry.clone()).plan(&request)
}

/// Specs of the scenes that need another attempt, in batch order.
pub fn scenes_for_regeneration(specs: &[SceneSpec], failed: &[SceneId]) -> Vec<SceneSpec> {
    let failed: HashSet<&SceneId> = failed.iter().collect();
    specs
        .iter()
        .filter(|spec| failed.contains(&spec.scene_id))
        .cloned()
        .collect()
}
