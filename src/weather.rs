//! Current weather from the OpenWeatherMap service

use crate::config::SearchConfig;
use crate::error::LookupError;
use crate::models::{Coordinate, WeatherSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

/// Service label used in errors and logs
const SERVICE: &str = "weather";

/// Source of the current conditions at a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch the current weather at a place
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherSnapshot, LookupError>;
}

/// Client for the OpenWeatherMap current weather API
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client from the search configuration
    pub fn new(config: &SearchConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("howfar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
            api_key: config.openweather_api_key.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherSnapshot, LookupError> {
        let url = format!("{}/weather", self.base_url);
        debug!("weather request for {}", at.format_coordinates());

        let lat = at.latitude.to_string();
        let lon = at.longitude.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("weather request failed with status {status}");
            return Err(LookupError::fetch(SERVICE, status.as_u16()));
        }

        let body: openweather::CurrentResponse = response.json().await.map_err(|e| {
            error!("failed to parse weather response: {e}");
            LookupError::schema(SERVICE, e.to_string())
        })?;

        let snapshot = WeatherSnapshot::try_from(body)?;
        info!(
            "weather: {} at {:.1}°C",
            snapshot.description, snapshot.temperature_c
        );
        Ok(snapshot)
    }
}

/// `OpenWeatherMap` current weather response structures
mod openweather {
    use serde::Deserialize;

    /// Top-level current weather response
    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub weather: Vec<Condition>,
        pub main: MainMeasurements,
        /// Observation time, unix seconds UTC
        pub dt: i64,
        /// Shift of the place's local clock from UTC, seconds
        pub timezone: i32,
    }

    /// Condition entry; the first element is the primary condition
    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub description: String,
        pub icon: String,
    }

    /// Core measurement block
    #[derive(Debug, Deserialize)]
    pub struct MainMeasurements {
        pub temp: f32,
        pub humidity: u8,
    }
}

impl TryFrom<openweather::CurrentResponse> for WeatherSnapshot {
    type Error = LookupError;

    fn try_from(response: openweather::CurrentResponse) -> Result<Self, Self::Error> {
        let condition = response
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::schema(SERVICE, "empty weather condition list"))?;

        let observed_at = DateTime::<Utc>::from_timestamp(response.dt, 0).ok_or_else(|| {
            LookupError::schema(SERVICE, format!("timestamp {} out of range", response.dt))
        })?;

        Ok(WeatherSnapshot {
            description: condition.description,
            icon: condition.icon,
            temperature_c: response.main.temp,
            humidity: response.main.humidity,
            observed_at,
            utc_offset_seconds: response.timezone,
        })
    }
}
