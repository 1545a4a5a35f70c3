//! Generation time estimates.
//!
//! A fixed ±50% band around a per-scene base time. This is a heuristic for
//! progress display and poll cadence, not a guarantee.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::SHORT_SCENE_MAX_SECS;

/// Base processing time per short scene, in seconds.
const SHORT_SCENE_BASE_SECS: u64 = 45;

/// Base processing time per long scene, in seconds.
const LONG_SCENE_BASE_SECS: u64 = 90;

/// Expected wall-clock time for a batch, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEstimate {
    pub min_secs: u64,
    pub average_secs: u64,
    pub max_secs: u64,
}

/// Estimate how long a batch of `scene_count` scenes takes.
///
/// Callers must pass a positive scene count.
pub fn estimate(scene_count: u32, per_scene_duration_secs: u32) -> TimeEstimate {
    let base = if per_scene_duration_secs <= SHORT_SCENE_MAX_SECS {
        SHORT_SCENE_BASE_SECS
    } else {
        LONG_SCENE_BASE_SECS
    };

    let average = base * scene_count as u64;
    TimeEstimate {
        min_secs: (average as f64 * 0.5).round() as u64,
        average_secs: average,
        max_secs: (average as f64 * 1.5).round() as u64,
    }
}

/// Poll cadence derived from an estimate, clamped to 2-10 seconds.
pub fn suggested_poll_interval(estimate: &TimeEstimate) -> Duration {
    let secs = (estimate.average_secs / SHORT_SCENE_BASE_SECS).clamp(2, 10);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_scene_estimate() {
        let est = estimate(4, 5);
        assert_eq!(est.average_secs, 180);
        assert_eq!(est.min_secs, 90);
        assert_eq!(est.max_secs, 270);
    }

    #[test]
    fn test_long_scene_estimate() {
        let est = estimate(3, 10);
        assert_eq!(est.average_secs, 270);
        assert_eq!(est.min_secs, 135);
        assert_eq!(est.max_secs, 405);
    }

    #[test]
    fn test_rounding() {
        // 45 * 0.5 = 22.5 rounds half away from zero
        let est = estimate(1, 5);
        assert_eq!(est.min_secs, 23);
        assert_eq!(est.max_secs, 68);
    }

    #[test]
    fn test_suggested_poll_interval() {
        assert_eq!(suggested_poll_interval(&estimate(1, 5)), Duration::from_secs(2));
        assert_eq!(suggested_poll_interval(&estimate(4, 5)), Duration::from_secs(4));
        assert_eq!(suggested_poll_interval(&estimate(20, 10)), Duration::from_secs(10));
    }
}
