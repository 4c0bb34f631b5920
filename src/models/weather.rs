//! Current weather snapshot for a selected place

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions at a place, fetched fresh for every selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Human-readable condition, e.g. "light rain"
    pub description: String,
    /// Condition icon code from the weather service, e.g. "10d"
    pub icon: String,
    /// Air temperature in degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Observation time in UTC
    pub observed_at: DateTime<Utc>,
    /// Shift of the place's local clock from UTC, in seconds
    pub utc_offset_seconds: i32,
}

impl WeatherSnapshot {
    /// Observation time in the place's local timezone
    ///
    /// Falls back to UTC when the reported offset is outside the
    /// representable range.
    #[must_use]
    pub fn local_time(&self) -> DateTime<FixedOffset> {
        match FixedOffset::east_opt(self.utc_offset_seconds) {
            Some(offset) => self.observed_at.with_timezone(&offset),
            None => self.observed_at.fixed_offset(),
        }
    }

    /// Local observation time formatted as "HH:MM"
    #[must_use]
    pub fn local_time_hhmm(&self) -> String {
        self.local_time().format("%H:%M").to_string()
    }

    /// URL of the condition icon image
    #[must_use]
    pub fn icon_url(&self) -> String {
        format!("http://openweathermap.org/img/wn/{}.png", self.icon)
    }
}
