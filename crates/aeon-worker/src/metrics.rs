//! Prometheus metrics for the worker.

use std::time::Duration;

use metrics::histogram;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{WorkerError, WorkerResult};

/// Metric name constants for consistency.
pub mod names {
    /// Wall-clock time of a whole batch, launch to final poll.
    pub const BATCH_DURATION_SECONDS: &str = "aeon_batch_duration_seconds";
}

/// Initialize the Prometheus metrics recorder.
///
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::config_error(format!("failed to install Prometheus recorder: {}", e)))
}

/// Record how long a batch took, by outcome.
pub fn record_batch_duration(outcome: &'static str, elapsed: Duration) {
    histogram!(names::BATCH_DURATION_SECONDS, "outcome" => outcome).record(elapsed.as_secs_f64());
}
