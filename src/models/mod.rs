//! Data models for the `EcoBreathe` core
//!
//! This module contains the domain models organized by concern:
//! - Location: validated coordinates and IP-derived locations
//! - Reading: resolved AQI readings and their flat wire record
//! - Symptoms: self-reported symptom logs
//! - Assessment: risk engine output
//! - Forecast: hourly air quality forecasts and risk trajectories

pub mod assessment;
pub mod forecast;
pub mod location;
pub mod reading;
pub mod symptoms;

// Re-export all public types for convenient access
pub use assessment::{AsthmaAttackRisk, HeatStressRisk, OverallStatus, RespiratoryRisk, RiskAssessment};
pub use forecast::{ForecastPoint, HourlyRisk, RiskForecast, Trajectory};
pub use location::{Coordinates, GeoLocation};
pub use reading::{AqiReading, AqiRecord, AqiSource, CoordinateSource, FetchOrigin, Observation, ResolvedAqi};
pub use symptoms::{Severity, SymptomItem, SymptomLog};
