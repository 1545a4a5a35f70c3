//! Scene generation worker.
//!
//! This crate provides:
//! - Batch runner: plan, launch and poll one batch of scenes
//! - Structured batch logging
//! - Prometheus metrics
//! - Configuration from the environment

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use batch::{BatchReport, BatchRunner};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::BatchLogger;
