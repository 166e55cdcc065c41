//! Air quality forecast models

use super::{Coordinates, OverallStatus, RespiratoryRisk};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hourly point of the provider's air quality forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Start of the forecast hour
    pub time: DateTime<Utc>,
    pub aqi: Option<i32>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

/// Direction of the health score across the forecast window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trajectory {
    Improving,
    Stable,
    Worsening,
}

/// A forecast hour run through the risk engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRisk {
    pub time: DateTime<Utc>,
    pub aqi: i32,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub health_score: u8,
    pub overall_status: OverallStatus,
    pub respiratory_risk: RespiratoryRisk,
}

/// Multi-hour risk outlook for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskForecast {
    pub trajectory: Trajectory,
    /// Assessed hours in chronological order
    pub forecast_hours: Vec<HourlyRisk>,
    pub coordinates: Coordinates,
    pub generated_at: DateTime<Utc>,
}
