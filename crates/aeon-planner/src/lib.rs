//! Scene planning for multi-model video generation.
//!
//! Pure, I/O-free building blocks used before a batch is launched:
//! - `registry`: catalog of generation models and the per-scene selection rule
//! - `planner`: splits a requested duration into scene specs
//! - `estimator`: wall-clock expectations for a batch

pub mod error;
pub mod estimator;
pub mod planner;
pub mod registry;

pub use error::{PlanError, PlanResult};
pub use estimator::{estimate, suggested_poll_interval, TimeEstimate};
pub use planner::{create_scene_inputs, scenes_for_regeneration, PlanRequest, ScenePlanner};
pub use registry::{ModelRegistry, ModelTier, SHORT_SCENE_MAX_SECS};
