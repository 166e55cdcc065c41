//! Resolved air-quality readings
//!
//! A resolution always ends in exactly one [`AqiReading`] variant. Each variant
//! carries only the fields its path guarantees: a device reading never has
//! particulates or coordinates, an unavailable reading never has an AQI.
//! [`AqiRecord`] is the flat shape handed to storage and HTTP collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;
use crate::EcoBreatheError;

/// Which source supplied the AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiSource {
    #[serde(rename = "device")]
    Device,
    #[serde(rename = "open-meteo")]
    OpenMeteo,
    #[serde(rename = "last_known")]
    LastKnown,
    #[serde(rename = "unavailable")]
    Unavailable,
}

impl AqiSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AqiSource::Device => "device",
            AqiSource::OpenMeteo => "open-meteo",
            AqiSource::LastKnown => "last_known",
            AqiSource::Unavailable => "unavailable",
        }
    }
}

/// Provenance of the coordinates used for a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSource {
    Gps,
    Ip,
    Default,
    Cached,
    None,
}

impl CoordinateSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateSource::Gps => "gps",
            CoordinateSource::Ip => "ip",
            CoordinateSource::Default => "default",
            CoordinateSource::Cached => "cached",
            CoordinateSource::None => "none",
        }
    }
}

/// How the coordinates of a live fetch were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOrigin {
    Gps,
    Ip,
    Default,
}

impl From<FetchOrigin> for CoordinateSource {
    fn from(origin: FetchOrigin) -> Self {
        match origin {
            FetchOrigin::Gps => CoordinateSource::Gps,
            FetchOrigin::Ip => CoordinateSource::Ip,
            FetchOrigin::Default => CoordinateSource::Default,
        }
    }
}

/// One successful air-quality fetch from the upstream provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// US AQI, absent when the provider omitted it
    pub aqi: Option<i32>,
    /// PM2.5 in µg/m³
    pub pm2_5: Option<f64>,
    /// PM10 in µg/m³
    pub pm10: Option<f64>,
    /// Coordinates reported by the provider
    pub coordinates: Coordinates,
    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
    /// City name, known only for IP-derived locations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// The canonical outcome of one AQI resolution
#[derive(Debug, Clone, PartialEq)]
pub enum AqiReading {
    /// The on-device sensor value passed validation
    Device { aqi: i32, recorded_at: DateTime<Utc> },
    /// A live fetch from the air quality provider
    Fetched {
        observation: Observation,
        origin: FetchOrigin,
    },
    /// The caller-supplied last known good observation
    LastKnown { observation: Observation },
    /// Every source failed
    Unavailable { checked_at: DateTime<Utc> },
}

impl AqiReading {
    #[must_use]
    pub fn unavailable() -> Self {
        AqiReading::Unavailable {
            checked_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn aqi(&self) -> Option<i32> {
        match self {
            AqiReading::Device { aqi, .. } => Some(*aqi),
            AqiReading::Fetched { observation, .. } | AqiReading::LastKnown { observation } => {
                observation.aqi
            }
            AqiReading::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn pm2_5(&self) -> Option<f64> {
        self.observation().and_then(|o| o.pm2_5)
    }

    #[must_use]
    pub fn pm10(&self) -> Option<f64> {
        self.observation().and_then(|o| o.pm10)
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.observation().map(|o| o.coordinates)
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.observation().and_then(|o| o.city.as_deref())
    }

    #[must_use]
    pub fn source(&self) -> AqiSource {
        match self {
            AqiReading::Device { .. } => AqiSource::Device,
            AqiReading::Fetched { .. } => AqiSource::OpenMeteo,
            AqiReading::LastKnown { .. } => AqiSource::LastKnown,
            AqiReading::Unavailable { .. } => AqiSource::Unavailable,
        }
    }

    #[must_use]
    pub fn coordinate_source(&self) -> CoordinateSource {
        match self {
            AqiReading::Fetched { origin, .. } => (*origin).into(),
            AqiReading::LastKnown { .. } => CoordinateSource::Cached,
            AqiReading::Device { .. } | AqiReading::Unavailable { .. } => CoordinateSource::None,
        }
    }

    /// Timestamp of the value: fetch time, device receipt time, or time of the failed check
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AqiReading::Device { recorded_at, .. } => *recorded_at,
            AqiReading::Fetched { observation, .. } | AqiReading::LastKnown { observation } => {
                observation.fetched_at
            }
            AqiReading::Unavailable { checked_at } => *checked_at,
        }
    }

    fn observation(&self) -> Option<&Observation> {
        match self {
            AqiReading::Fetched { observation, .. } | AqiReading::LastKnown { observation } => {
                Some(observation)
            }
            _ => None,
        }
    }
}

/// A reading plus the rejected device value that forced the fallback, if any
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAqi {
    pub reading: AqiReading,
    /// Raw device AQI that failed validation
    pub rejected_device_aqi: Option<i32>,
}

impl ResolvedAqi {
    #[must_use]
    pub fn new(reading: AqiReading) -> Self {
        Self {
            reading,
            rejected_device_aqi: None,
        }
    }

    #[must_use]
    pub fn flagged(reading: AqiReading, raw_device_aqi: i32) -> Self {
        Self {
            reading,
            rejected_device_aqi: Some(raw_device_aqi),
        }
    }

    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.rejected_device_aqi.is_some()
    }

    /// The observation to persist as the new last known good value.
    ///
    /// Only live provider fetches qualify; device, cached and unavailable
    /// readings are never written back.
    #[must_use]
    pub fn cacheable_observation(&self) -> Option<&Observation> {
        match &self.reading {
            AqiReading::Fetched { observation, .. } => Some(observation),
            _ => None,
        }
    }

    #[must_use]
    pub fn should_cache(&self) -> bool {
        self.cacheable_observation().is_some()
    }

    #[must_use]
    pub fn to_record(&self) -> AqiRecord {
        AqiRecord::from(self)
    }
}

/// Flat wire representation of a resolved reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiRecord {
    pub aqi: Option<i32>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fetched_at: DateTime<Utc>,
    pub source: AqiSource,
    pub coordinate_source: CoordinateSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default)]
    pub flagged_device_aqi: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_device_aqi: Option<i32>,
}

impl From<&ResolvedAqi> for AqiRecord {
    fn from(resolved: &ResolvedAqi) -> Self {
        let reading = &resolved.reading;
        let coordinates = reading.coordinates();
        Self {
            aqi: reading.aqi(),
            pm2_5: reading.pm2_5(),
            pm10: reading.pm10(),
            latitude: coordinates.map(|c| c.latitude()),
            longitude: coordinates.map(|c| c.longitude()),
            fetched_at: reading.timestamp(),
            source: reading.source(),
            coordinate_source: reading.coordinate_source(),
            city: reading.city().map(str::to_string),
            flagged_device_aqi: resolved.is_flagged(),
            raw_device_aqi: resolved.rejected_device_aqi,
        }
    }
}

/// Rebuild a cached observation from a stored record
impl TryFrom<AqiRecord> for Observation {
    type Error = EcoBreatheError;

    fn try_from(record: AqiRecord) -> Result<Self, Self::Error> {
        let (Some(latitude), Some(longitude)) = (record.latitude, record.longitude) else {
            return Err(EcoBreatheError::validation(
                "stored AQI record has no coordinates",
            ));
        };
        Ok(Observation {
            aqi: record.aqi,
            pm2_5: record.pm2_5,
            pm10: record.pm10,
            coordinates: Coordinates::new(latitude, longitude)?,
            fetched_at: record.fetched_at,
            city: record.city,
        })
    }
}
