//! Error types and handling for `EcoBreathe`

use thiserror::Error;

/// Main error type for the `EcoBreathe` core
#[derive(Error, Debug)]
pub enum EcoBreatheError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream provider errors (air quality, geolocation)
    #[error("Upstream error from {provider}: {message}")]
    Upstream { provider: String, message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl EcoBreatheError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new upstream error for the named provider
    pub fn upstream<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EcoBreatheError::Config { .. } => {
                "Configuration error. Please check your config file and environment variables."
                    .to_string()
            }
            EcoBreatheError::Upstream { provider, .. } => {
                format!("Unable to reach {provider}. Please check your internet connection.")
            }
            EcoBreatheError::Validation { message } => {
                format!("Invalid input: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = EcoBreatheError::config("missing default latitude");
        assert!(matches!(config_err, EcoBreatheError::Config { .. }));

        let upstream_err = EcoBreatheError::upstream("open-meteo", "HTTP 503");
        assert!(matches!(upstream_err, EcoBreatheError::Upstream { .. }));
        assert_eq!(
            upstream_err.to_string(),
            "Upstream error from open-meteo: HTTP 503"
        );

        let validation_err = EcoBreatheError::validation("latitude out of range");
        assert!(matches!(validation_err, EcoBreatheError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = EcoBreatheError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let upstream_err = EcoBreatheError::upstream("ip-api", "test");
        assert!(upstream_err.user_message().contains("Unable to reach ip-api"));

        let validation_err = EcoBreatheError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }
}
