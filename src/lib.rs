//! `howfar` - Location search with distance and live weather
//!
//! This library provides the core functionality for a location lookup
//! widget: debounced typeahead suggestions, great-circle distance from
//! the user's position, and current conditions at the chosen place.

pub mod config;
pub mod controller;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod geolocate;
pub mod models;
pub mod weather;

// Re-export core types for public API
pub use config::SearchConfig;
pub use controller::{SearchController, SearchState, SearchUpdate};
pub use error::{ConfigError, GeolocationError, LookupError};
pub use geocoding::{MapboxGeocoding, SuggestionProvider};
pub use geolocate::{EnvPosition, FixedPosition, Geolocator, PositionSource};
pub use models::{Coordinate, PlaceCandidate, WeatherSnapshot, truncate_with_ellipsis};
pub use weather::{OpenWeatherClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, LookupError>;
