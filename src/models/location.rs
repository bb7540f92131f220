//! Coordinate model for geographic positions

use serde::{Deserialize, Serialize};

use crate::error::PlaceFinderError;

/// A point on the globe in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate without range checks
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting out-of-range or non-finite values
    pub fn try_new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(PlaceFinderError::validation(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(PlaceFinderError::validation(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }

        Ok(Self::new(latitude, longitude))
    }

    /// Format as a "lat,lng" pair, the shape most place APIs expect
    #[must_use]
    pub fn to_query_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Format coordinates for display
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates to the given number of decimal places
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }
}
