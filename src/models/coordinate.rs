//! Coordinate model for validated geographic points

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a latitude/longitude pair is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number")]
    NotFinite,

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Geographic point in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(try_from = "CoordinateFields")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

/// Wire shape of [`Coordinate`], validated on conversion
#[derive(Deserialize)]
struct CoordinateFields {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<CoordinateFields> for Coordinate {
    type Error = CoordinateError;

    fn try_from(fields: CoordinateFields) -> Result<Self, Self::Error> {
        Self::new(fields.latitude, fields.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting anything outside the WGS84 range
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.check()?;
        Ok(coordinate)
    }

    /// Re-validate the range invariant
    pub fn check(&self) -> Result<(), CoordinateError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Round coordinates to a fixed number of decimal digits for comparison
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (i64, i64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(6));
        // Ranges are bounded by 180 * 10^precision, well inside i64.
        let lat = (self.latitude * multiplier).round() as i64;
        let lon = (self.longitude * multiplier).round() as i64;
        (lat, lon)
    }

    /// Render as a KML `coordinates` tuple (`lon,lat,alt`)
    ///
    /// `f64`'s `Display` is locale independent and never uses exponent
    /// notation, so the output is always plain decimal.
    #[must_use]
    pub fn to_kml(&self) -> String {
        format!("{},{},0", self.longitude, self.latitude)
    }
}
