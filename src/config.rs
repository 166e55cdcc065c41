//! Configuration management for `EcoBreathe`
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables, and validates every setting before the resolver is built.
//! Configuration is read once at startup and passed explicitly to the
//! components that need it.

use crate::EcoBreatheError;
use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Deployment variables kept from the original service, applied last.
const LEGACY_DEFAULT_LAT: &str = "DEFAULT_LAT";
const LEGACY_DEFAULT_LON: &str = "DEFAULT_LON";
const LEGACY_TIMEOUT: &str = "AQI_TIMEOUT_SECONDS";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcoBreatheConfig {
    /// Fallback chain settings
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// External provider endpoints
    #[serde(default)]
    pub providers: ProviderConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings that drive the AQI fallback chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Latitude of the deployment's home region
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,
    /// Longitude of the deployment's home region
    #[serde(default = "default_longitude")]
    pub default_longitude: f64,
    /// Timeout applied to every outbound call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
}

/// External provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Open-Meteo air quality API
    #[serde(default = "default_air_quality_base_url")]
    pub air_quality_base_url: String,
    /// Base URL of the IP geolocation API
    #[serde(default = "default_geolocation_base_url")]
    pub geolocation_base_url: String,
    /// Number of hourly points requested for forecasts
    #[serde(default = "default_forecast_hours")]
    pub forecast_hours: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_latitude() -> f64 {
    6.5244
}

fn default_longitude() -> f64 {
    3.3792
}

fn default_timeout() -> f64 {
    3.0
}

fn default_air_quality_base_url() -> String {
    "https://air-quality-api.open-meteo.com/v1".to_string()
}

fn default_geolocation_base_url() -> String {
    "http://ip-api.com".to_string()
}

fn default_forecast_hours() -> u32 {
    6
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            air_quality_base_url: default_air_quality_base_url(),
            geolocation_base_url: default_geolocation_base_url(),
            forecast_hours: default_forecast_hours(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ResolverConfig {
    /// Timeout for a single outbound call
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

impl EcoBreatheConfig {
    /// Load configuration from the default file and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the specified path and the process environment
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_from_sources(config_path, std::env::vars().collect())
    }

    /// Load configuration from a file path and an explicit set of variables
    pub fn load_from_sources(config_path: Option<PathBuf>, vars: Map<String, String>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(Self::get_config_path);

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ECOBREATHE_RESOLVER__TIMEOUT_SECONDS=5 and friends
        builder = builder.add_source(
            Environment::with_prefix("ECOBREATHE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        builder = builder
            .set_override_option("resolver.default_latitude", vars.get(LEGACY_DEFAULT_LAT).cloned())?
            .set_override_option("resolver.default_longitude", vars.get(LEGACY_DEFAULT_LON).cloned())?
            .set_override_option("resolver.timeout_seconds", vars.get(LEGACY_TIMEOUT).cloned())?;

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: EcoBreatheConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> PathBuf {
        PathBuf::from("ecobreathe.toml")
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.resolver.timeout_seconds == 0.0 {
            self.resolver.timeout_seconds = default_timeout();
        }
        if self.providers.air_quality_base_url.is_empty() {
            self.providers.air_quality_base_url = default_air_quality_base_url();
        }
        if self.providers.geolocation_base_url.is_empty() {
            self.providers.geolocation_base_url = default_geolocation_base_url();
        }
        if self.providers.forecast_hours == 0 {
            self.providers.forecast_hours = default_forecast_hours();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_coordinates()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_coordinates(&self) -> Result<()> {
        let lat = self.resolver.default_latitude;
        let lon = self.resolver.default_longitude;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(EcoBreatheError::config(format!(
                "Default latitude {lat} is outside [-90, 90]"
            ))
            .into());
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(EcoBreatheError::config(format!(
                "Default longitude {lon} is outside [-180, 180]"
            ))
            .into());
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeout = self.resolver.timeout_seconds;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(EcoBreatheError::config("Request timeout must be a positive number of seconds").into());
        }

        if timeout > 60.0 {
            return Err(EcoBreatheError::config("Request timeout cannot exceed 60 seconds").into());
        }

        if self.providers.forecast_hours > 48 {
            return Err(EcoBreatheError::config("Forecast hours cannot exceed 48").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EcoBreatheError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(EcoBreatheError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Air quality", &self.providers.air_quality_base_url),
            ("Geolocation", &self.providers.geolocation_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EcoBreatheError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_file() -> Option<PathBuf> {
        Some(PathBuf::from("does-not-exist/ecobreathe.toml"))
    }

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = EcoBreatheConfig::default();
        assert_eq!(config.resolver.default_latitude, 6.5244);
        assert_eq!(config.resolver.default_longitude, 3.3792);
        assert_eq!(config.resolver.timeout(), Duration::from_secs(3));
        assert_eq!(
            config.providers.air_quality_base_url,
            "https://air-quality-api.open-meteo.com/v1"
        );
        assert_eq!(config.providers.forecast_hours, 6);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_sources_uses_defaults() {
        let config = EcoBreatheConfig::load_from_sources(no_file(), Map::new()).unwrap();
        assert_eq!(config.resolver.default_latitude, 6.5244);
        assert_eq!(config.providers.geolocation_base_url, "http://ip-api.com");
    }

    #[test]
    fn test_prefixed_environment_override() {
        let config = EcoBreatheConfig::load_from_sources(
            no_file(),
            vars(&[
                ("ECOBREATHE_RESOLVER__TIMEOUT_SECONDS", "5"),
                ("ECOBREATHE_LOGGING__FORMAT", "json"),
            ]),
        )
        .unwrap();
        assert_eq!(config.resolver.timeout_seconds, 5.0);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_legacy_variables_take_priority() {
        let config = EcoBreatheConfig::load_from_sources(
            no_file(),
            vars(&[
                ("ECOBREATHE_RESOLVER__DEFAULT_LATITUDE", "1.0"),
                ("DEFAULT_LAT", "51.5072"),
                ("DEFAULT_LON", "-0.1276"),
                ("AQI_TIMEOUT_SECONDS", "1.5"),
            ]),
        )
        .unwrap();
        assert_eq!(config.resolver.default_latitude, 51.5072);
        assert_eq!(config.resolver.default_longitude, -0.1276);
        assert_eq!(config.resolver.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_default_latitude_is_rejected() {
        let result = EcoBreatheConfig::load_from_sources(no_file(), vars(&[("DEFAULT_LAT", "95")]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("latitude"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = EcoBreatheConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = EcoBreatheConfig::default();
        config.resolver.timeout_seconds = 500.0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot exceed 60"));

        let mut config = EcoBreatheConfig::default();
        config.resolver.timeout_seconds = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = EcoBreatheConfig::default();
        config.resolver.timeout_seconds = 0.0;
        config.providers.air_quality_base_url.clear();
        config.providers.forecast_hours = 0;
        config.apply_defaults();
        assert_eq!(config.resolver.timeout_seconds, 3.0);
        assert_eq!(config.providers.forecast_hours, 6);
        assert!(config.providers.air_quality_base_url.starts_with("https://"));
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut config = EcoBreatheConfig::default();
        config.providers.geolocation_base_url = "ftp://ip-api.com".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Geolocation base URL"));
    }
}
