//! Shared data models for AEON scene generation.
//!
//! This crate provides Serde-serializable types for:
//! - Generation model descriptors
//! - Scene specifications and their validation
//! - Per-scene launch results
//! - Job status tracking and batch summaries

pub mod job_status;
pub mod launch;
pub mod model;
pub mod scene;
pub mod summary;

// Re-export common types
pub use job_status::{JobState, JobStatus};
pub use launch::{LaunchReport, LaunchResult, LaunchStatus};
pub use model::ModelDescriptor;
pub use scene::{SceneId, SceneSpec, ValidationError, ValidationResult};
pub use summary::BatchSummary;
