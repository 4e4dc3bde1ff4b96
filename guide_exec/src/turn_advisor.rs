//! # Turn advisor

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use comms_if::signal::{Side, SignalToken};
use serde::{Deserialize, Serialize};

use crate::geodesy::signed_angle_diff;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TurnAdvisor {
    /// Half width of the cone in which the target counts as straight ahead
    dead_zone_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDecision {
    Ahead,
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TurnAdvisor {
    pub fn new(dead_zone_deg: f64) -> Self {
        Self { dead_zone_deg }
    }

    pub fn decide(&self, heading_deg: Option<f64>, target_bearing_deg: Option<f64>) -> TurnDecision {
        decide(heading_deg, target_bearing_deg, self.dead_zone_deg)
    }
}

impl TurnDecision {
    /// The wristband side and token to pulse for this decision, `None` for ahead.
    pub fn signal(&self) -> Option<(Side, SignalToken)> {
        match self {
            TurnDecision::Ahead => None,
            TurnDecision::Left => Some((Side::Left, SignalToken::Left)),
            TurnDecision::Right => Some((Side::Right, SignalToken::Right)),
        }
    }
}

impl Display for TurnDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnDecision::Ahead => write!(f, "Ahead"),
            TurnDecision::Left => write!(f, "Left"),
            TurnDecision::Right => write!(f, "Right"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decide which way to turn to face the target.
///
/// Missing (or non-finite) inputs default to ahead.
pub fn decide(
    heading_deg: Option<f64>,
    target_bearing_deg: Option<f64>,
    dead_zone_deg: f64,
) -> TurnDecision {
    let (heading, bearing) = match (heading_deg, target_bearing_deg) {
        (Some(h), Some(b)) if h.is_finite() && b.is_finite() => (h, b),
        _ => return TurnDecision::Ahead,
    };

    let diff = signed_angle_diff(bearing, heading);

    if diff.abs() <= dead_zone_deg {
        TurnDecision::Ahead
    } else if diff > 0.0 {
        TurnDecision::Right
    } else {
        TurnDecision::Left
    }
}
