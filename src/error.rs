//! Error types for the location search pipeline

use thiserror::Error;

/// Failures produced while fetching suggestions or weather
#[derive(Error, Debug)]
pub enum LookupError {
    /// The request was superseded or torn down before it finished
    ///
    /// Not a fault: callers drop the result without logging it as one.
    #[error("request canceled")]
    Canceled,

    /// The service answered with a non-success status
    #[error("{service} request failed with status {status}")]
    Fetch { service: &'static str, status: u16 },

    /// The request never produced a response
    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// The service answered successfully but the body did not match the
    /// expected schema
    #[error("{service} returned an unexpected response: {message}")]
    Schema {
        service: &'static str,
        message: String,
    },
}

impl LookupError {
    /// Create a fetch error for a non-success response
    #[must_use]
    pub fn fetch(service: &'static str, status: u16) -> Self {
        Self::Fetch { service, status }
    }

    /// Create a schema error for a malformed response body
    pub fn schema<S: Into<String>>(service: &'static str, message: S) -> Self {
        Self::Schema {
            service,
            message: message.into(),
        }
    }

    /// True when the failure is a cancellation rather than a real fault
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, LookupError::Canceled)
    }
}

/// Failure kinds reported by a position source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    /// The user denied the position request
    #[error("geolocation permission denied")]
    PermissionDenied,

    /// The position could not be determined
    #[error("position unavailable")]
    PositionUnavailable,

    /// The position request did not answer in time
    #[error("geolocation timed out")]
    Timeout,

    /// The host exposes no position capability
    #[error("geolocation not supported")]
    NotSupported,
}

/// Configuration loading and validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing environment variable {name}")]
    MissingVar { name: &'static str },

    /// A setting failed validation
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Create a missing-variable error
    #[must_use]
    pub fn missing(name: &'static str) -> Self {
        Self::MissingVar { name }
    }

    /// Create a validation error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let fetch_err = LookupError::fetch("geocoding", 429);
        assert!(matches!(fetch_err, LookupError::Fetch { status: 429, .. }));

        let schema_err = LookupError::schema("weather", "empty condition list");
        assert!(matches!(schema_err, LookupError::Schema { .. }));
    }

    #[test]
    fn test_canceled_is_not_a_fault() {
        assert!(LookupError::Canceled.is_canceled());
        assert!(!LookupError::fetch("geocoding", 500).is_canceled());
    }

    #[test]
    fn test_error_display() {
        let fetch_err = LookupError::fetch("geocoding", 401);
        assert_eq!(
            fetch_err.to_string(),
            "geocoding request failed with status 401"
        );

        let schema_err = LookupError::schema("weather", "empty condition list");
        assert!(schema_err.to_string().contains("unexpected response"));

        assert_eq!(
            GeolocationError::PermissionDenied.to_string(),
            "geolocation permission denied"
        );
    }

    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::missing("HOWFAR_MAPBOX_ACCESS_TOKEN");
        assert!(missing.to_string().contains("HOWFAR_MAPBOX_ACCESS_TOKEN"));

        let invalid = ConfigError::invalid("debounce out of range");
        assert!(invalid.to_string().contains("debounce out of range"));
    }
}
