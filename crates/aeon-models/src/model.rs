//! Generation model descriptors.

use serde::{Deserialize, Serialize};

/// A remote video generation model the backend can fan out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Short model identifier sent to the backend (e.g. "kling")
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Longest scene the model can produce, in seconds
    pub max_scene_duration_secs: u32,
    /// Provider model reference (e.g. "kwaivgi/kling-v1.6-standard")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_version: Option<String>,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        max_scene_duration_secs: u32,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            max_scene_duration_secs,
            backend_version: None,
        }
    }

    /// Attach the provider model reference.
    pub fn with_backend_version(mut self, version: impl Into<String>) -> Self {
        self.backend_version = Some(version.into());
        self
    }

    /// Whether a scene of the given length fits this model.
    pub fn supports_duration(&self, duration_secs: u32) -> bool {
        duration_secs <= self.max_scene_duration_secs
    }
}
