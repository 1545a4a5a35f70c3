//! Model registry refresh.

use aeon_planner::ModelRegistry;
use tracing::{info, warn};

use crate::backend::GenerationBackend;

/// Load the model registry from the backend catalog.
///
/// Falls back to the built-in registry when the catalog cannot be fetched
/// or does not describe two usable tiers.
pub async fn load_registry<B>(backend: &B) -> ModelRegistry
where
    B: GenerationBackend + ?Sized,
{
    let catalog = match backend.fetch_catalog().await {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("Failed to fetch model catalog, using built-in models: {}", e);
            return ModelRegistry::builtin();
        }
    };

    match catalog.into_registry() {
        Ok(registry) => {
            info!(models = registry.models().len(), "Loaded model catalog from backend");
            registry
        }
        Err(e) => {
            warn!("Backend model catalog rejected, using built-in models: {}", e);
            ModelRegistry::builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;
    use crate::testing::FakeBackend;
    use crate::types::ModelCatalogResponse;
    use serde_json::json;

    #[tokio::test]
    async fn test_uses_backend_catalog() {
        let catalog: ModelCatalogResponse = serde_json::from_value(json!({
            "fast_models_5s": [{ "id": "kling", "name": "Kling", "max_duration": 10 }],
            "stable_models_10s": [{ "id": "luma", "name": "Luma", "max_duration": 10 }]
        }))
        .unwrap();
        let backend = FakeBackend::acknowledging_all().with_catalog(Ok(catalog));

        let registry = load_registry(&backend).await;
        assert_eq!(registry.select_model_for_scene(0, 5), "kling");
        assert_eq!(registry.select_model_for_scene(2, 8), "luma");
    }

    #[tokio::test]
    async fn test_falls_back_when_fetch_fails() {
        let backend = FakeBackend::acknowledging_all()
            .with_catalog(Err(GenError::ServiceUnavailable("down".to_string())));

        let registry = load_registry(&backend).await;
        assert_eq!(registry, ModelRegistry::builtin());
    }

    #[tokio::test]
    async fn test_falls_back_on_empty_tier() {
        let catalog: ModelCatalogResponse = serde_json::from_value(json!({
            "fast_models_5s": [{ "id": "kling", "name": "Kling", "max_duration": 10 }]
        }))
        .unwrap();
        let backend = FakeBackend::acknowledging_all().with_catalog(Ok(catalog));

        let registry = load_registry(&backend).await;
        assert_eq!(registry.select_model_for_scene(0, 5), "minimax");
    }
}
