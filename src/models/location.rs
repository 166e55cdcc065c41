//! Geographic coordinates and resolved locations

use serde::{Deserialize, Serialize};

use crate::EcoBreatheError;

/// Validated latitude/longitude pair
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    /// Latitude in decimal degrees
    latitude: f64,
    /// Longitude in decimal degrees
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = EcoBreatheError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Coordinates::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    /// Create coordinates, rejecting values outside the geographic bounds
    pub fn new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(EcoBreatheError::validation(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(EcoBreatheError::validation(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Coordinates derived from an IP lookup, with the provider's city name
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeoLocation {
    pub coordinates: Coordinates,
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(6.5244, 3.3792)]
    fn test_accepts_coordinates_within_bounds(#[case] lat: f64, #[case] lon: f64) {
        let coords = Coordinates::new(lat, lon).unwrap();
        assert_eq!(coords.latitude(), lat);
        assert_eq!(coords.longitude(), lon);
    }

    #[rstest]
    #[case(90.1, 0.0)]
    #[case(-999.0, 0.0)]
    #[case(0.0, 180.5)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_rejects_coordinates_out_of_bounds(#[case] lat: f64, #[case] lon: f64) {
        let err = Coordinates::new(lat, lon).unwrap_err();
        assert!(matches!(err, EcoBreatheError::Validation { .. }));
    }

    #[test]
    fn test_deserialization_validates_bounds() {
        let ok: Coordinates = serde_json::from_str(r#"{"latitude": 6.5, "longitude": 3.4}"#).unwrap();
        assert_eq!(ok.format_coordinates(), "6.5000, 3.4000");

        let bad = serde_json::from_str::<Coordinates>(r#"{"latitude": 999, "longitude": 999}"#);
        assert!(bad.is_err());
    }
}
