//! # Defines Telemetry Pack for Navigation

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use comms_if::route::NodeId;
use serde::{Deserialize, Serialize};

use crate::{
    geodesy::{distance_m, initial_bearing_deg, normalize_angle, GeoPoint},
    heading_filter::{cardinal_label, Cardinal},
    waypoint::NavState,
};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Display data derived from the last fix, the smoothed heading and the target.
///
/// Each field is `None` when one of its inputs is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NavSnapshot {
    pub bearing_to_target_deg: Option<f64>,

    /// Bearing to the target relative to the heading, in `[0, 360)`
    pub relative_angle_deg: Option<f64>,

    pub distance_m: Option<f64>,

    pub heading_deg: Option<f64>,

    pub heading_label: Option<Cardinal>,
}

/// One row of navigation telemetry. Flat so it can be archived as CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavTm {
    pub time_s: f64,
    pub state: Option<NavState>,
    pub route_name: Option<String>,
    pub current_node: Option<NodeId>,
    pub previous_node: Option<NodeId>,
    pub fix_lat: Option<f64>,
    pub fix_lon: Option<f64>,
    pub fix_accuracy_m: Option<f64>,
    pub heading_deg: Option<f64>,
    pub heading_label: Option<Cardinal>,
    pub bearing_to_target_deg: Option<f64>,
    pub relative_angle_deg: Option<f64>,
    pub distance_m: Option<f64>,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl NavSnapshot {
    pub fn compute(
        position: Option<&GeoPoint>,
        heading_deg: Option<f64>,
        target: Option<&GeoPoint>,
    ) -> Self {
        let (bearing, distance) = match (position, target) {
            (Some(p), Some(t)) => (Some(initial_bearing_deg(p, t)), Some(distance_m(p, t))),
            _ => (None, None),
        };

        let relative = match (bearing, heading_deg) {
            (Some(b), Some(h)) => Some(normalize_angle(b - h)),
            _ => None,
        };

        Self {
            bearing_to_target_deg: bearing,
            relative_angle_deg: relative,
            distance_m: distance,
            heading_deg,
            heading_label: heading_deg.and_then(cardinal_label),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_snapshot() {
        let here = GeoPoint::new(0.0, 0.0);
        let target = GeoPoint::new(0.0, 0.001);

        let s = NavSnapshot::compute(Some(&here), Some(100.0), Some(&target));
        assert!((s.bearing_to_target_deg.unwrap() - 90.0).abs() < 1e-9);
        assert!((s.relative_angle_deg.unwrap() - 350.0).abs() < 1e-9);
        assert!((s.distance_m.unwrap() - 111.19).abs() < 0.01);
        assert_eq!(s.heading_label, Some(Cardinal::E));

        let s = NavSnapshot::compute(Some(&here), None, Some(&target));
        assert!(s.bearing_to_target_deg.is_some());
        assert_eq!(s.relative_angle_deg, None);
        assert_eq!(s.heading_label, None);

        let s = NavSnapshot::compute(None, Some(10.0), Some(&target));
        assert_eq!(s.distance_m, None);
        assert_eq!(s.relative_angle_deg, None);
        assert_eq!(s.heading_label, Some(Cardinal::N));

        assert_eq!(NavSnapshot::compute(None, None, None), NavSnapshot::default());
    }
}
