//! Scene specifications.
//!
//! A scene is one independently generated video segment. A batch is an
//! ordered list of scenes planned for a single video request.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a scene identifier.
pub const MAX_SCENE_ID_LEN: usize = 50;

/// Maximum length of a scene prompt.
pub const MAX_PROMPT_LEN: usize = 1000;

/// Accepted scene duration range in seconds.
pub const MIN_SCENE_DURATION_SECS: u32 = 1;
pub const MAX_SCENE_DURATION_SECS: u32 = 60;

/// Accepted frame dimension range in pixels.
pub const MIN_DIMENSION: u32 = 64;
pub const MAX_DIMENSION: u32 = 1920;

/// Maximum number of scenes in one batch.
pub const MAX_SCENES_PER_BATCH: usize = 20;

const FORBIDDEN_ID_CHARS: [char; 7] = ['<', '>', '"', '\'', '`', '/', '\\'];

/// Errors raised when a scene or batch is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Batch contains no scenes")]
    EmptyBatch,

    #[error("Batch has {0} scenes, maximum is 20")]
    TooManyScenes(usize),

    #[error("Duplicate scene ID: {0}")]
    DuplicateSceneId(String),

    #[error("Invalid scene ID '{0}'")]
    InvalidSceneId(String),

    #[error("Invalid prompt for scene {scene_id}: {reason}")]
    InvalidPrompt { scene_id: String, reason: String },

    #[error("Scene {scene_id} duration {duration_secs}s out of range")]
    InvalidDuration { scene_id: String, duration_secs: u32 },

    #[error("Scene {scene_id} dimensions {width}x{height} out of range")]
    InvalidDimensions {
        scene_id: String,
        width: u32,
        height: u32,
    },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Identifier of a scene, unique within its batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    /// Build the identifier for scene `index` of a batch started at `batch_timestamp_ms`.
    pub fn for_batch(batch_timestamp_ms: i64, index: usize) -> Self {
        Self(format!("scene_{}_{}", batch_timestamp_ms, index))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One scene to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub scene_id: SceneId,
    /// Prompt including the positional annotation
    pub prompt_text: String,
    pub duration_secs: u32,
    /// Registry model identifier
    pub model_id: String,
    pub width: u32,
    pub height: u32,
}

impl SceneSpec {
    /// Validate the scene against the backend's accepted limits.
    pub fn validate(&self) -> ValidationResult<()> {
        let id = self.scene_id.as_str();
        if id.trim().is_empty()
            || id.len() > MAX_SCENE_ID_LEN
            || id.contains(FORBIDDEN_ID_CHARS)
        {
            return Err(ValidationError::InvalidSceneId(id.to_string()));
        }

        if self.prompt_text.trim().is_empty() {
            return Err(ValidationError::InvalidPrompt {
                scene_id: id.to_string(),
                reason: "prompt is empty".to_string(),
            });
        }

        if self.prompt_text.chars().count() > MAX_PROMPT_LEN {
            return Err(ValidationError::InvalidPrompt {
                scene_id: id.to_string(),
                reason: format!("prompt longer than {} characters", MAX_PROMPT_LEN),
            });
        }

        if !(MIN_SCENE_DURATION_SECS..=MAX_SCENE_DURATION_SECS).contains(&self.duration_secs) {
            return Err(ValidationError::InvalidDuration {
                scene_id: id.to_string(),
                duration_secs: self.duration_secs,
            });
        }

        let dims = MIN_DIMENSION..=MAX_DIMENSION;
        if !dims.contains(&self.width) || !dims.contains(&self.height) {
            return Err(ValidationError::InvalidDimensions {
                scene_id: id.to_string(),
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }

    /// Validate a whole batch: size limits, unique ids and every scene.
    pub fn validate_batch(scenes: &[SceneSpec]) -> ValidationResult<()> {
        if scenes.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        if scenes.len() > MAX_SCENES_PER_BATCH {
            return Err(ValidationError::TooManyScenes(scenes.len()));
        }

        let mut seen = HashSet::with_capacity(scenes.len());
        for scene in scenes {
            if !seen.insert(&scene.scene_id) {
                return Err(ValidationError::DuplicateSceneId(scene.scene_id.to_string()));
            }
            scene.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str) -> SceneSpec {
        SceneSpec {
            scene_id: SceneId::from_string(id),
            prompt_text: "a sunset timelapse - Scene 1 of 1".to_string(),
            duration_secs: 5,
            model_id: "kling".to_string(),
            width: 576,
            height: 1024,
        }
    }

    #[test]
    fn test_scene_id_for_batch() {
        let id = SceneId::for_batch(1_700_000_000_000, 3);
        assert_eq!(id.as_str(), "scene_1700000000000_3");
        assert!(id.as_str().len() <= MAX_SCENE_ID_LEN);
    }

    #[test]
    fn test_valid_scene() {
        assert!(scene("scene_1").validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_scene_id() {
        assert!(matches!(
            scene("../etc").validate(),
            Err(ValidationError::InvalidSceneId(_))
        ));
        assert!(scene("").validate().is_err());
        assert!(scene(&"x".repeat(51)).validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut s = scene("scene_1");
        s.duration_secs = 0;
        assert!(matches!(s.validate(), Err(ValidationError::InvalidDuration { .. })));

        let mut s = scene("scene_1");
        s.width = 32;
        assert!(matches!(s.validate(), Err(ValidationError::InvalidDimensions { .. })));

        let mut s = scene("scene_1");
        s.prompt_text = "   ".to_string();
        assert!(matches!(s.validate(), Err(ValidationError::InvalidPrompt { .. })));
    }

    #[test]
    fn test_validate_batch() {
        assert_eq!(SceneSpec::validate_batch(&[]), Err(ValidationError::EmptyBatch));

        let dup = vec![scene("a"), scene("a")];
        assert_eq!(
            SceneSpec::validate_batch(&dup),
            Err(ValidationError::DuplicateSceneId("a".to_string()))
        );

        let many: Vec<_> = (0..21).map(|i| scene(&format!("s{}", i))).collect();
        assert_eq!(
            SceneSpec::validate_batch(&many),
            Err(ValidationError::TooManyScenes(21))
        );

        assert!(SceneSpec::validate_batch(&[scene("a"), scene("b")]).is_ok());
    }
}
