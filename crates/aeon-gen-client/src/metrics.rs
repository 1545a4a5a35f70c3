//! Generation client metrics.
//!
//! Provides standardized metrics for monitoring batches:
//! - Request counters and latency by operation and status
//! - Launch counters by outcome
//! - Poll cycle counters and batch outcomes

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total backend requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "aeon_backend_requests_total";

    /// Backend request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "aeon_backend_latency_seconds";

    /// Scenes launched by outcome.
    pub const SCENES_LAUNCHED_TOTAL: &str = "aeon_launch_scenes_total";

    /// Poll cycles by result.
    pub const POLL_CYCLES_TOTAL: &str = "aeon_poll_cycles_total";

    /// Finished batches by outcome.
    pub const BATCHES_TOTAL: &str = "aeon_poll_batches_total";
}

/// Record a completed backend request.
pub fn record_request(operation: &str, status: u16, latency: Duration) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency.as_secs_f64());
}

/// Record the per-scene outcome of a batch launch.
pub fn record_launch(successful: usize, failed: usize) {
    counter!(names::SCENES_LAUNCHED_TOTAL, "outcome" => "launched").increment(successful as u64);
    counter!(names::SCENES_LAUNCHED_TOTAL, "outcome" => "failed").increment(failed as u64);
}

/// Record one poll cycle ("ok" or "transport_error").
pub fn record_poll_cycle(result: &'static str) {
    counter!(names::POLL_CYCLES_TOTAL, "result" => result).increment(1);
}

/// Record how a batch finished.
pub fn record_batch_outcome(outcome: &'static str) {
    counter!(names::BATCHES_TOTAL, "outcome" => outcome).increment(1);
}
