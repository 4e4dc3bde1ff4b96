//! # Sensor samples
//!
//! Position and heading samples delivered by the sensor collaborator. The
//! collaborator owns permissions and subscriptions, these types only carry
//! the readings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One GPS reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lon: f64,

    /// Reported horizontal accuracy in meters, if known
    #[serde(default)]
    pub accuracy_m: Option<f64>,

    /// Ground speed in meters/second, if known
    #[serde(default)]
    pub speed_ms: Option<f64>,

    /// Time the fix was taken
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// One raw compass heading reading, in degrees clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingSample {
    pub heading_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Fix {
    /// Create a new fix timestamped now.
    pub fn new(lat: f64, lon: f64, accuracy_m: Option<f64>) -> Self {
        Self {
            lat,
            lon,
            accuracy_m,
            speed_ms: None,
            timestamp: Utc::now(),
        }
    }

    /// Returns true if the coordinates of the fix are usable numbers.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// The accuracy in meters, treating a missing or non-numeric accuracy as zero.
    pub fn accuracy_or_zero(&self) -> f64 {
        match self.accuracy_m {
            Some(a) if a.is_finite() => a,
            _ => 0.0,
        }
    }
}

impl HeadingSample {
    pub fn new(heading_deg: f64) -> Self {
        Self { heading_deg }
    }

    /// Returns true if the heading is a usable number.
    pub fn is_valid(&self) -> bool {
        self.heading_deg.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fix_validation() {
        assert!(Fix::new(52.5, 6.1, None).is_valid());
        assert!(!Fix::new(f64::NAN, 6.1, None).is_valid());
        assert!(!Fix::new(52.5, f64::INFINITY, None).is_valid());

        assert!(HeadingSample::new(359.0).is_valid());
        assert!(!HeadingSample::new(f64::NAN).is_valid());
    }

    #[test]
    fn test_accuracy_or_zero() {
        assert_eq!(Fix::new(0.0, 0.0, Some(5.0)).accuracy_or_zero(), 5.0);
        assert_eq!(Fix::new(0.0, 0.0, None).accuracy_or_zero(), 0.0);
        assert_eq!(Fix::new(0.0, 0.0, Some(f64::NAN)).accuracy_or_zero(), 0.0);
    }

    #[test]
    fn test_fix_json_without_optionals() {
        let fix: Fix = serde_json::from_str(r#"{"lat": 52.5, "lon": 6.1}"#).unwrap();
        assert_eq!(fix.lat, 52.5);
        assert_eq!(fix.accuracy_m, None);
        assert_eq!(fix.speed_ms, None);
    }
}
