//! # NavMgr Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::NavMgrError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tuning of the navigation manager, loaded from `guide.toml`. Every field must be given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavMgrParams {
    /// Minimum distance in meters at which a waypoint counts as reached. Widened to the accuracy
    /// of each fix when that is larger.
    pub arrival_threshold_m: f64,

    /// Heading smoothing factor in `(0, 1]`
    pub smoothing_alpha: f64,

    /// Half width in degrees of the cone in which the target counts as straight ahead
    pub turn_dead_zone_deg: f64,

    /// Maximum distance in meters to a node the target may snap to when off course
    pub off_course_threshold_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavMgrParams {
    /// The values shipped in `params/guide.toml`.
    pub fn canonical() -> Self {
        Self {
            arrival_threshold_m: 10.0,
            smoothing_alpha: 0.15,
            turn_dead_zone_deg: 5.0,
            off_course_threshold_m: 20.0,
        }
    }

    pub fn validate(&self) -> Result<(), NavMgrError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.arrival_threshold_m) {
            return Err(NavMgrError::InvalidParams(format!(
                "arrival_threshold_m must be positive, got {}",
                self.arrival_threshold_m
            )));
        }

        if !positive(self.off_course_threshold_m) {
            return Err(NavMgrError::InvalidParams(format!(
                "off_course_threshold_m must be positive, got {}",
                self.off_course_threshold_m
            )));
        }

        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(NavMgrError::InvalidParams(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }

        if !(self.turn_dead_zone_deg.is_finite() && self.turn_dead_zone_deg >= 0.0) {
            return Err(NavMgrError::InvalidParams(format!(
                "turn_dead_zone_deg must not be negative, got {}",
                self.turn_dead_zone_deg
            )));
        }

        Ok(())
    }
}
