//! AQI fallback resolution chain
//!
//! Turns a device reading or an optional location into exactly one
//! [`ResolvedAqi`]. Sources are tried in strict priority order and the first
//! success wins:
//!
//! 1. the device value, when it passes validation
//! 2. GPS coordinates supplied by the caller
//! 3. the caller's IP address, geolocated, only when no GPS fix was given
//! 4. the configured default location
//! 5. the caller's last known good observation
//! 6. an explicit "unavailable" reading
//!
//! Every networked step is bounded by the configured timeout and tried at most
//! once. Failures are logged and never returned to the caller.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::air_quality::{AirQualitySource, OpenMeteoClient};
use crate::config::EcoBreatheConfig;
use crate::forecast::{ForecastContext, assess_forecast};
use crate::location_resolver::{CallerContext, Geolocator, IpApiGeolocator, LocationResolver};
use crate::models::{AqiReading, Coordinates, FetchOrigin, Observation, ResolvedAqi, RiskForecast};
use crate::validator;

/// Resolver wired to the production providers
pub type DefaultAqiResolver = AqiResolver<OpenMeteoClient, IpApiGeolocator>;

/// The fallback chain over an air quality source and a geolocator
#[derive(Debug, Clone)]
pub struct AqiResolver<S, G> {
    source: S,
    locator: LocationResolver<G>,
    default_coordinates: Coordinates,
    timeout: Duration,
}

impl DefaultAqiResolver {
    /// Build the production resolver; both providers share one HTTP client
    pub fn from_config(config: &EcoBreatheConfig) -> Result<Self> {
        let timeout = config.resolver.timeout();
        let client = crate::http_client(timeout)?;

        let source = OpenMeteoClient::with_client(
            client.clone(),
            &config.providers.air_quality_base_url,
            config.providers.forecast_hours,
        );
        let geolocator = IpApiGeolocator::with_client(client, &config.providers.geolocation_base_url);
        let default_coordinates = Coordinates::new(
            config.resolver.default_latitude,
            config.resolver.default_longitude,
        )?;

        Ok(Self::new(source, geolocator, default_coordinates, timeout))
    }
}

impl<S: AirQualitySource, G: Geolocator> AqiResolver<S, G> {
    pub fn new(source: S, geolocator: G, default_coordinates: Coordinates, timeout: Duration) -> Self {
        Self {
            source,
            locator: LocationResolver::new(geolocator),
            default_coordinates,
            timeout,
        }
    }

    /// Resolve a reading pushed by the on-device sensor.
    ///
    /// Valid values are returned as-is without touching the network. Invalid
    /// ones are flagged and replaced by the location chain's result.
    #[instrument(skip(self, caller, last_known))]
    pub async fn resolve_from_device(
        &self,
        raw_aqi: i32,
        caller: Option<&CallerContext>,
        last_known: Option<&Observation>,
    ) -> ResolvedAqi {
        if validator::is_valid(raw_aqi) {
            info!(step = "device", outcome = "accepted", aqi = raw_aqi, "Using device AQI");
            return ResolvedAqi::new(AqiReading::Device {
                aqi: raw_aqi,
                recorded_at: Utc::now(),
            });
        }

        warn!(
            step = "device",
            outcome = "rejected",
            raw_aqi,
            "Invalid device AQI, falling back to external sources"
        );
        let fallback = self.resolve_from_location(None, caller, last_known).await;
        ResolvedAqi::flagged(fallback.reading, raw_aqi)
    }

    /// Resolve the current AQI without a device reading.
    ///
    /// Supplied coordinates are authoritative: when their fetch fails the
    /// caller's IP is not consulted and the chain continues with the default
    /// location.
    #[instrument(skip_all, fields(gps = coordinates.is_some()))]
    pub async fn resolve_from_location(
        &self,
        coordinates: Option<Coordinates>,
        caller: Option<&CallerContext>,
        last_known: Option<&Observation>,
    ) -> ResolvedAqi {
        match (coordinates, caller) {
            (Some(coordinates), _) => {
                if let Some(observation) = self.fetch_current("gps", coordinates).await {
                    return Self::fetched(observation, FetchOrigin::Gps);
                }
            }
            (None, Some(caller)) => {
                let location = self
                    .bounded("ip_geolocation", self.locator.resolve(caller))
                    .await;
                if let Some(location) = location {
                    if let Some(mut observation) = self.fetch_current("ip", location.coordinates).await {
                        observation.city = location.city;
                        return Self::fetched(observation, FetchOrigin::Ip);
                    }
                }
            }
            (None, None) => {}
        }

        if let Some(observation) = self.fetch_current("default", self.default_coordinates).await {
            return Self::fetched(observation, FetchOrigin::Default);
        }

        Self::last_resort(last_known)
    }

    /// Hourly risk outlook for the coordinates, or the default location.
    ///
    /// Returns `None` when the forecast provider failed.
    #[instrument(skip_all, fields(gps = coordinates.is_some()))]
    pub async fn forecast(
        &self,
        coordinates: Option<Coordinates>,
        context: ForecastContext,
    ) -> Option<RiskForecast> {
        let coordinates = coordinates.unwrap_or(self.default_coordinates);
        let points = self
            .bounded("forecast", self.source.fetch_forecast(coordinates))
            .await?;
        Some(assess_forecast(&points, context, coordinates))
    }

    async fn fetch_current(&self, step: &'static str, coordinates: Coordinates) -> Option<Observation> {
        self.bounded(step, self.source.fetch_current(coordinates)).await
    }

    /// Run one chain step under the timeout and log its outcome
    async fn bounded<T, F>(&self, step: &'static str, future: F) -> Option<T>
    where
        F: Future<Output = Option<T>>,
    {
        match tokio::time::timeout(self.timeout, future).await {
            Ok(Some(value)) => {
                info!(step, outcome = "success", "AQI chain step succeeded");
                Some(value)
            }
            Ok(None) => {
                warn!(step, outcome = "failure", "AQI chain step failed");
                None
            }
            Err(_) => {
                warn!(
                    step,
                    outcome = "timeout",
                    "AQI chain step timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                );
                None
            }
        }
    }

    fn fetched(observation: Observation, origin: FetchOrigin) -> ResolvedAqi {
        ResolvedAqi::new(AqiReading::Fetched { observation, origin })
    }

    fn last_resort(last_known: Option<&Observation>) -> ResolvedAqi {
        match last_known {
            Some(observation) => {
                info!(step = "last_known", outcome = "success", "Serving last known AQI");
                ResolvedAqi::new(AqiReading::LastKnown {
                    observation: observation.clone(),
                })
            }
            None => {
                warn!(step = "unavailable", outcome = "exhausted", "All AQI sources failed");
                ResolvedAqi::new(AqiReading::unavailable())
            }
        }
    }
}
