//! Data models for the location search widget
//!
//! Core domain models organized by concern:
//! - Location: coordinate pairs and place suggestions
//! - Weather: the current-conditions snapshot shown for a selection

pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinate, PlaceCandidate, truncate_with_ellipsis};
pub use weather::WeatherSnapshot;
