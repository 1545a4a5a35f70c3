//! Structured batch logging utilities.
//!
//! Provides consistent, structured logging for one generation batch with
//! tracing spans and contextual information.

use aeon_gen_client::PollProgress;
use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Batch logger for structured logging with consistent formatting.
///
/// Every line carries the batch id and scene count.
#[derive(Debug, Clone)]
pub struct BatchLogger {
    batch_id: String,
    scene_count: usize,
}

impl BatchLogger {
    /// Create a new batch logger.
    pub fn new(batch_id: &Uuid, scene_count: usize) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            scene_count,
        }
    }

    /// Log the start of a batch stage.
    pub fn log_start(&self, message: &str) {
        info!(
            batch_id = %self.batch_id,
            scene_count = self.scene_count,
            "Batch started: {}", message
        );
    }

    /// Log one poll cycle.
    pub fn log_progress(&self, progress: &PollProgress) {
        let summary = &progress.summary;
        info!(
            batch_id = %self.batch_id,
            attempt = progress.attempt,
            completed = summary.completed,
            failed = summary.failed,
            in_progress = summary.in_progress,
            "Batch progress: {}% done", summary.percent_done()
        );
    }

    /// Log a warning for the batch.
    pub fn log_warning(&self, message: &str) {
        warn!(
            batch_id = %self.batch_id,
            scene_count = self.scene_count,
            "Batch warning: {}", message
        );
    }

    /// Log a batch error.
    pub fn log_error(&self, message: &str) {
        error!(
            batch_id = %self.batch_id,
            scene_count = self.scene_count,
            "Batch error: {}", message
        );
    }

    /// Log the completion of the batch.
    pub fn log_completion(&self, message: &str) {
        info!(
            batch_id = %self.batch_id,
            scene_count = self.scene_count,
            "Batch completed: {}", message
        );
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn scene_count(&self) -> usize {
        self.scene_count
    }

    /// Create a tracing span for this batch.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "batch",
            batch_id = %self.batch_id,
            scene_count = self.scene_count
        )
    }
}
