//! `EcoBreathe` - Air quality resolution and environmental health risk scoring
//!
//! This library turns raw device readings, GPS fixes or bare network context
//! into a single trustworthy AQI value, and scores temperature, humidity, AQI
//! and self-reported symptoms into a health assessment.

pub mod air_quality;
pub mod config;
pub mod error;
pub mod forecast;
pub mod location_resolver;
pub mod models;
pub mod resolution;
pub mod risk;
pub mod telemetry;
pub mod validator;

use std::time::Duration;

// Re-export core types for public API
pub use air_quality::{AirQualitySource, OpenMeteoClient};
pub use config::EcoBreatheConfig;
pub use error::EcoBreatheError;
pub use forecast::{ForecastContext, assess_forecast};
pub use location_resolver::{CallerContext, Geolocator, IpApiGeolocator, LocationResolver};
pub use models::{
    AqiReading, AqiRecord, Coordinates, Observation, ResolvedAqi, RiskAssessment, RiskForecast,
    SymptomLog,
};
pub use resolution::{AqiResolver, DefaultAqiResolver};
pub use risk::{assess, symptom_score};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EcoBreatheError>;

/// HTTP client shared by the upstream providers
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("EcoBreathe/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_http_client_builds() {
        assert!(http_client(Duration::from_secs(3)).is_ok());
    }
}
