//! # Heading filter
//!
//! Exponential smoothing of the raw compass heading. The blend is performed on an unwrapped
//! heading so that crossing north (359 -> 0) moves the output the short way round rather than
//! sweeping back through south.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::geodesy::{normalize_angle, signed_angle_diff};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Smoothing filter for compass headings.
#[derive(Debug, Clone)]
pub struct HeadingFilter {
    /// Blend factor in `(0, 1]`, 1 disables smoothing
    alpha: f64,

    /// The last smoothed heading, `None` until the first valid sample
    last_smoothed_deg: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Eight point compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinal {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HeadingFilter {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            last_smoothed_deg: None,
        }
    }

    /// Feed a raw heading sample into the filter.
    ///
    /// Returns the new smoothed heading, or `None` if the sample was not a finite number, in which
    /// case the filter state is untouched.
    pub fn update(&mut self, raw_deg: f64) -> Option<f64> {
        if !raw_deg.is_finite() {
            debug!("Rejected non-finite heading sample {}", raw_deg);
            return None;
        }

        let smoothed = match self.last_smoothed_deg {
            None => normalize_angle(raw_deg),
            Some(last) => {
                let unwrapped = last + signed_angle_diff(raw_deg, last);
                normalize_angle(last + self.alpha * (unwrapped - last))
            }
        };

        self.last_smoothed_deg = Some(smoothed);

        Some(smoothed)
    }

    /// The current smoothed heading, if any sample has been accepted.
    pub fn heading_deg(&self) -> Option<f64> {
        self.last_smoothed_deg
    }
}

impl Cardinal {
    const ROSE: [Cardinal; 8] = [
        Cardinal::N,
        Cardinal::NE,
        Cardinal::E,
        Cardinal::SE,
        Cardinal::S,
        Cardinal::SW,
        Cardinal::W,
        Cardinal::NW,
    ];
}

impl Display for Cardinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Cardinal::N => "N",
            Cardinal::NE => "NE",
            Cardinal::E => "E",
            Cardinal::SE => "SE",
            Cardinal::S => "S",
            Cardinal::SW => "SW",
            Cardinal::W => "W",
            Cardinal::NW => "NW",
        };

        write!(f, "{}", s)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map a heading onto the eight point compass rose.
///
/// Sector boundaries sit at `22.5 + 45k` degrees, so north covers `[337.5, 22.5)`. Returns `None`
/// for a non-finite heading.
pub fn cardinal_label(deg: f64) -> Option<Cardinal> {
    if !deg.is_finite() {
        return None;
    }

    // Shift by half a sector so each sector starts on a multiple of 45
    let sector = (normalize_angle(deg + 22.5) / 45.0).floor() as usize;

    Cardinal::ROSE.get(sector % 8).copied()
}
