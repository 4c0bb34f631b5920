//! Configuration for the search pipeline
//!
//! Everything comes from `HOWFAR_*` environment variables. Only the two
//! service credentials are required; every other setting has a default
//! and can be overridden per instance with the builder methods.

use crate::error::ConfigError;
use std::env;
use std::time::Duration;

const ENV_MAPBOX_TOKEN: &str = "HOWFAR_MAPBOX_ACCESS_TOKEN";
const ENV_OPENWEATHER_KEY: &str = "HOWFAR_OPENWEATHER_API_KEY";
const ENV_GEOCODING_URL: &str = "HOWFAR_GEOCODING_URL";
const ENV_WEATHER_URL: &str = "HOWFAR_WEATHER_URL";
const ENV_TIMEOUT_SECS: &str = "HOWFAR_TIMEOUT_SECS";
const ENV_DEBOUNCE_MS: &str = "HOWFAR_DEBOUNCE_MS";

/// Settings for the search controller and its service clients
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Mapbox geocoding access token
    pub mapbox_access_token: String,
    /// OpenWeatherMap API key
    pub openweather_api_key: String,
    /// Base URL of the geocoding service
    pub geocoding_base_url: String,
    /// Base URL of the weather service
    pub weather_base_url: String,
    /// HTTP transport timeout in seconds
    pub timeout_seconds: u64,
    /// Quiet period between the last keystroke and the suggestion fetch
    pub debounce_ms: u64,
    /// Queries shorter than this many characters issue no fetch
    pub min_query_len: usize,
    /// Maximum number of suggestions requested per query
    pub suggestion_limit: u8,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_min_query_len() -> usize {
    2
}

fn default_suggestion_limit() -> u8 {
    4
}

impl SearchConfig {
    /// Build a configuration from credentials, with default settings
    #[must_use]
    pub fn new<S: Into<String>>(mapbox_access_token: S, openweather_api_key: S) -> Self {
        Self {
            mapbox_access_token: mapbox_access_token.into(),
            openweather_api_key: openweather_api_key.into(),
            geocoding_base_url: default_geocoding_base_url(),
            weather_base_url: default_weather_base_url(),
            timeout_seconds: default_timeout_seconds(),
            debounce_ms: default_debounce_ms(),
            min_query_len: default_min_query_len(),
            suggestion_limit: default_suggestion_limit(),
        }
    }

    /// Load configuration from `HOWFAR_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mapbox_access_token =
            env::var(ENV_MAPBOX_TOKEN).map_err(|_| ConfigError::missing(ENV_MAPBOX_TOKEN))?;
        let openweather_api_key =
            env::var(ENV_OPENWEATHER_KEY).map_err(|_| ConfigError::missing(ENV_OPENWEATHER_KEY))?;

        let mut config = Self::new(mapbox_access_token, openweather_api_key);

        if let Ok(url) = env::var(ENV_GEOCODING_URL) {
            config.geocoding_base_url = url;
        }
        if let Ok(url) = env::var(ENV_WEATHER_URL) {
            config.weather_base_url = url;
        }
        if let Ok(value) = env::var(ENV_TIMEOUT_SECS) {
            config.timeout_seconds = parse_number(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Ok(value) = env::var(ENV_DEBOUNCE_MS) {
            config.debounce_ms = parse_number(ENV_DEBOUNCE_MS, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Override the geocoding base URL
    #[must_use]
    pub fn with_geocoding_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.geocoding_base_url = url.into();
        self
    }

    /// Override the weather base URL
    #[must_use]
    pub fn with_weather_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.weather_base_url = url.into();
        self
    }

    /// Override the debounce quiet period
    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Override the minimum query length
    #[must_use]
    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    /// Override the suggestion cap
    #[must_use]
    pub fn with_suggestion_limit(mut self, suggestion_limit: u8) -> Self {
        self.suggestion_limit = suggestion_limit;
        self
    }

    /// Validate all settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_urls()?;
        Ok(())
    }

    /// Validate the service credentials
    fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.mapbox_access_token.is_empty() {
            return Err(ConfigError::invalid("Mapbox access token cannot be empty"));
        }
        if self.openweather_api_key.is_empty() {
            return Err(ConfigError::invalid("OpenWeatherMap API key cannot be empty"));
        }
        Ok(())
    }

    /// Validate numeric setting ranges
    fn validate_numeric_ranges(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err(ConfigError::invalid(
                "transport timeout must be between 1 and 300 seconds",
            ));
        }
        if self.debounce_ms > 10_000 {
            return Err(ConfigError::invalid("debounce cannot exceed 10000 ms"));
        }
        if self.min_query_len == 0 {
            return Err(ConfigError::invalid("minimum query length must be at least 1"));
        }
        if !(1..=10).contains(&self.suggestion_limit) {
            return Err(ConfigError::invalid(
                "suggestion limit must be between 1 and 10",
            ));
        }
        Ok(())
    }

    /// Validate the service base URLs
    fn validate_urls(&self) -> Result<(), ConfigError> {
        for url in [&self.geocoding_base_url, &self.weather_base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::invalid(format!(
                    "base URL must be HTTP or HTTPS, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    /// Transport timeout as a duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Debounce quiet period as a duration
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid(format!("{name} must be a number, got '{value}'")))
}
