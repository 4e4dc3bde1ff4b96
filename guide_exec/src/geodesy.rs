//! # Geodesy
//!
//! Spherical earth calculations used throughout the guidance system. All angles are in degrees,
//! bearings are measured clockwise from true north.
//!
//! None of these functions validate their inputs, a NaN coordinate produces a NaN result. Samples
//! are validated before they reach this module.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::sensor::Fix;
use serde::{Deserialize, Serialize};
use util::maths::{wrap_positive, wrap_signed};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Mean radius of the earth in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point on the earth's surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lon: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<&Fix> for GeoPoint {
    fn from(fix: &Fix) -> Self {
        Self::new(fix.lat, fix.lon)
    }
}

impl From<Fix> for GeoPoint {
    fn from(fix: Fix) -> Self {
        Self::from(&fix)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Great circle distance between two points in meters, using the haversine formula.
pub fn distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi_a = a.lat.to_radians();
    let phi_b = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial bearing (forward azimuth) from `a` to `b`, in `[0, 360)`.
///
/// The bearing between coincident points is 0.
pub fn initial_bearing_deg(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi_a = a.lat.to_radians();
    let phi_b = b.lat.to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let y = d_lambda.sin() * phi_b.cos();
    let x = phi_a.cos() * phi_b.sin() - phi_a.sin() * phi_b.cos() * d_lambda.cos();

    normalize_angle(y.atan2(x).to_degrees())
}

/// Wrap any angle into `[0, 360)`.
pub fn normalize_angle(deg: f64) -> f64 {
    wrap_positive(deg, 360.0)
}

/// The smallest signed rotation which takes `b` onto `a`, in `(-180, 180]`.
///
/// Positive values are clockwise rotations.
pub fn signed_angle_diff(a: f64, b: f64) -> f64 {
    wrap_signed(a - b, 360.0)
}
