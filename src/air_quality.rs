//! Air quality API client for Open-Meteo
//!
//! Fetches current and hourly forecast US AQI, PM2.5 and PM10 for a pair of
//! coordinates. Every failure (timeout, transport error, error status,
//! unexpected JSON) is logged and reported as `None`; callers treat that as
//! "source unavailable" and move on.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::models::{Coordinates, ForecastPoint, Observation};

/// Provider of current and forecast air quality
#[async_trait]
pub trait AirQualitySource: Send + Sync {
    /// Current conditions at the coordinates, `None` when the provider failed
    async fn fetch_current(&self, coordinates: Coordinates) -> Option<Observation>;

    /// Hourly forecast points in chronological order, `None` when the provider failed
    async fn fetch_forecast(&self, coordinates: Coordinates) -> Option<Vec<ForecastPoint>>;
}

/// Client for the Open-Meteo air quality API
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    forecast_hours: u32,
}

impl OpenMeteoClient {
    /// Create a client with its own HTTP client
    pub fn new(base_url: impl Into<String>, timeout: Duration, forecast_hours: u32) -> Result<Self> {
        let client = crate::http_client(timeout)?;
        Ok(Self::with_client(client, base_url, forecast_hours))
    }

    /// Create a client sharing an existing HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>, forecast_hours: u32) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            forecast_hours,
        }
    }

    async fn get(&self, url: &str) -> Result<openmeteo::AirQualityResponse> {
        debug!("Open-Meteo request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| "Open-Meteo request failed")?
            .error_for_status()
            .with_context(|| "Open-Meteo returned an error status")?;

        let body = response
            .json::<openmeteo::AirQualityResponse>()
            .await
            .with_context(|| "Failed to parse Open-Meteo air quality response")?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 2 {
            warn!(
                "Slow Open-Meteo response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(body)
    }

    #[instrument(level = "debug", skip(self))]
    async fn try_fetch_current(&self, coordinates: Coordinates) -> Result<Observation> {
        let url = format!(
            "{}/air-quality?latitude={}&longitude={}&current=pm2_5,pm10,us_aqi",
            self.base_url,
            coordinates.latitude(),
            coordinates.longitude()
        );

        let response = self.get(&url).await?;
        let observation = response.into_observation(coordinates);

        info!(
            aqi = ?observation.aqi,
            "Retrieved current air quality for {}",
            coordinates.format_coordinates()
        );
        Ok(observation)
    }

    #[instrument(level = "debug", skip(self))]
    async fn try_fetch_forecast(&self, coordinates: Coordinates) -> Result<Vec<ForecastPoint>> {
        let url = format!(
            "{}/air-quality?latitude={}&longitude={}&hourly=pm2_5,pm10,us_aqi&forecast_hours={}&timezone=GMT",
            self.base_url,
            coordinates.latitude(),
            coordinates.longitude(),
            self.forecast_hours
        );

        let response = self.get(&url).await?;
        let points = response.into_forecast_points(self.forecast_hours as usize);

        info!(
            "Retrieved {} forecast hours for {}",
            points.len(),
            coordinates.format_coordinates()
        );
        Ok(points)
    }
}

#[async_trait]
impl AirQualitySource for OpenMeteoClient {
    async fn fetch_current(&self, coordinates: Coordinates) -> Option<Observation> {
        match self.try_fetch_current(coordinates).await {
            Ok(observation) => Some(observation),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(error = %error, "Open-Meteo current air quality unavailable");
                None
            }
        }
    }

    async fn fetch_forecast(&self, coordinates: Coordinates) -> Option<Vec<ForecastPoint>> {
        match self.try_fetch_forecast(coordinates).await {
            Ok(points) => Some(points),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(error = %error, "Open-Meteo air quality forecast unavailable");
                None
            }
        }
    }
}

fn round_aqi(value: f64) -> Option<i32> {
    value.is_finite().then(|| value.round() as i32)
}

/// `Open-Meteo` air quality response structures and conversion utilities
mod openmeteo {
    use super::{Coordinates, ForecastPoint, NaiveDateTime, Observation, Utc, round_aqi};
    use serde::Deserialize;

    /// Hourly timestamps are ISO-8601 in GMT without seconds
    const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

    #[derive(Debug, Deserialize)]
    pub struct AirQualityResponse {
        pub latitude: Option<f64>,
        pub longitude: Option<f64>,
        pub current: Option<CurrentData>,
        pub hourly: Option<HourlyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub pm2_5: Option<f64>,
        pub pm10: Option<f64>,
        pub us_aqi: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub time: Vec<String>,
        pub pm2_5: Option<Vec<Option<f64>>>,
        pub pm10: Option<Vec<Option<f64>>>,
        pub us_aqi: Option<Vec<Option<f64>>>,
    }

    fn value_at(series: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
        series.as_ref().and_then(|values| values.get(i).copied().flatten())
    }

    impl AirQualityResponse {
        /// The provider snaps coordinates to its grid; keep the requested pair
        /// if the reported one is missing or out of range.
        fn grid_coordinates(&self, requested: Coordinates) -> Coordinates {
            match (self.latitude, self.longitude) {
                (Some(lat), Some(lon)) => Coordinates::new(lat, lon).unwrap_or(requested),
                _ => requested,
            }
        }

        pub fn into_observation(self, requested: Coordinates) -> Observation {
            let coordinates = self.grid_coordinates(requested);
            let current = self.current;
            Observation {
                aqi: current.as_ref().and_then(|c| c.us_aqi).and_then(round_aqi),
                pm2_5: current.as_ref().and_then(|c| c.pm2_5),
                pm10: current.as_ref().and_then(|c| c.pm10),
                coordinates,
                fetched_at: Utc::now(),
                city: None,
            }
        }

        pub fn into_forecast_points(self, limit: usize) -> Vec<ForecastPoint> {
            let Some(hourly) = self.hourly else {
                return Vec::new();
            };

            let mut points: Vec<ForecastPoint> = hourly
                .time
                .iter()
                .enumerate()
                .filter_map(|(i, time)| {
                    let time = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
                        .ok()?
                        .and_utc();
                    Some(ForecastPoint {
                        time,
                        aqi: value_at(&hourly.us_aqi, i).and_then(round_aqi),
                        pm2_5: value_at(&hourly.pm2_5, i),
                        pm10: value_at(&hourly.pm10, i),
                    })
                })
                .collect();

            points.sort_by_key(|p| p.time);
            points.truncate(limit);
            points
        }
    }
}
