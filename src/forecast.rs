//! Hourly risk outlook
//!
//! Runs each forecast hour through the risk engine under a fixed
//! temperature/humidity context and reports whether conditions are getting
//! better or worse over the window.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Coordinates, ForecastPoint, HourlyRisk, RiskForecast, Trajectory};
use crate::risk;

/// Score change across the window that counts as a trend
const TRAJECTORY_THRESHOLD: i32 = 10;

/// Weather context applied to every forecast hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastContext {
    pub temperature: f64,
    pub humidity: f64,
}

impl Default for ForecastContext {
    /// Typical coastal West African afternoon, used when no sensor reading exists
    fn default() -> Self {
        Self {
            temperature: 30.0,
            humidity: 70.0,
        }
    }
}

/// Assess every forecast hour that carries an AQI value
#[must_use]
pub fn assess_forecast(
    points: &[ForecastPoint],
    context: ForecastContext,
    coordinates: Coordinates,
) -> RiskForecast {
    let forecast_hours: Vec<HourlyRisk> = points
        .iter()
        .filter_map(|point| {
            let aqi = point.aqi?;
            let assessment = risk::assess(context.temperature, context.humidity, Some(aqi), None);
            Some(HourlyRisk {
                time: point.time,
                aqi,
                pm2_5: point.pm2_5,
                pm10: point.pm10,
                health_score: assessment.health_score,
                overall_status: assessment.overall_status,
                respiratory_risk: assessment.respiratory_risk,
            })
        })
        .collect();

    let skipped = points.len() - forecast_hours.len();
    if skipped > 0 {
        debug!("Skipped {} forecast hours without an AQI value", skipped);
    }

    RiskForecast {
        trajectory: determine_trajectory(&forecast_hours),
        forecast_hours,
        coordinates,
        generated_at: Utc::now(),
    }
}

fn determine_trajectory(hours: &[HourlyRisk]) -> Trajectory {
    let (Some(first), Some(last)) = (hours.first(), hours.last()) else {
        return Trajectory::Stable;
    };

    let diff = i32::from(last.health_score) - i32::from(first.health_score);
    if diff > TRAJECTORY_THRESHOLD {
        Trajectory::Improving
    } else if diff < -TRAJECTORY_THRESHOLD {
        Trajectory::Worsening
    } else {
        Trajectory::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverallStatus, RespiratoryRisk};
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn points(aqis: &[Option<i32>]) -> Vec<ForecastPoint> {
        let start = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        aqis.iter()
            .enumerate()
            .map(|(i, aqi)| ForecastPoint {
                time: start + Duration::hours(i as i64),
                aqi: *aqi,
                pm2_5: Some(10.0),
                pm10: None,
            })
            .collect()
    }

    fn lagos() -> Coordinates {
        Coordinates::new(6.5244, 3.3792).unwrap()
    }

    // Mild context so only the AQI band moves the score
    const MILD: ForecastContext = ForecastContext {
        temperature: 20.0,
        humidity: 40.0,
    };

    #[rstest]
    #[case(&[Some(160), Some(120), Some(40)], Trajectory::Improving)]
    #[case(&[Some(40), Some(120), Some(160)], Trajectory::Worsening)]
    #[case(&[Some(60), Some(200), Some(90)], Trajectory::Stable)]
    // 80 -> 90 is a change of exactly 10
    #[case(&[Some(120), Some(60)], Trajectory::Stable)]
    #[case(&[Some(250)], Trajectory::Stable)]
    #[case(&[], Trajectory::Stable)]
    fn test_trajectory(#[case] aqis: &[Option<i32>], #[case] expected: Trajectory) {
        let forecast = assess_forecast(&points(aqis), MILD, lagos());
        assert_eq!(forecast.trajectory, expected);
    }

    #[test]
    fn test_null_hours_are_skipped() {
        let forecast = assess_forecast(&points(&[Some(30), None, Some(180), None]), MILD, lagos());
        assert_eq!(forecast.forecast_hours.len(), 2);
        assert_eq!(forecast.forecast_hours[1].aqi, 180);
        assert_eq!(forecast.forecast_hours[1].respiratory_risk, RespiratoryRisk::High);
        assert_eq!(forecast.forecast_hours[1].health_score, 65);
        assert!(forecast.forecast_hours.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn test_default_context_applies_heat_stress() {
        let forecast = assess_forecast(&points(&[Some(20)]), ForecastContext::default(), lagos());
        // 30 C / 70 % is moderate heat stress
        assert_eq!(forecast.forecast_hours[0].health_score, 85);
        assert_eq!(forecast.forecast_hours[0].overall_status, OverallStatus::Safe);
    }

    #[test]
    fn test_hours_keep_their_own_scores() {
        let forecast = assess_forecast(&points(&[Some(30), Some(220), Some(90)]), MILD, lagos());
        let scores: Vec<u8> = forecast.forecast_hours.iter().map(|h| h.health_score).collect();
        assert_eq!(scores, vec![100, 55, 90]);
        assert_eq!(forecast.coordinates, lagos());
    }
}
