//! Geographic coordinates and place suggestions

use serde::{Deserialize, Serialize};

/// A coordinate pair in decimal degrees
///
/// Both components always travel together, so a half-known position
/// cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate pair
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are inside the valid geographic range
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Format as a coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One autocomplete suggestion from the geocoding service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    /// Opaque stable identifier assigned by the service
    pub id: String,
    /// Full display name, e.g. "Paris, France"
    pub place_name: String,
    /// Resolved position of the place
    pub coordinate: Coordinate,
}

impl PlaceCandidate {
    /// Create a new place candidate
    #[must_use]
    pub fn new<S: Into<String>>(id: S, place_name: S, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            place_name: place_name.into(),
            coordinate,
        }
    }
}

/// Shorten a display name to `max_chars`, marking the cut with "..."
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(51.5074, -0.1278).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.01).is_valid());
    }

    #[test]
    fn test_format_coordinates() {
        let coordinate = Coordinate::new(48.8566, 2.3522);
        assert_eq!(coordinate.format_coordinates(), "48.8566, 2.3522");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Paris, France", 21), "Paris, France");
        assert_eq!(
            truncate_with_ellipsis("Paris, Île-de-France, France", 21),
            "Paris, Île-de-France,..."
        );
    }

    #[test]
    fn test_truncate_exact_length_is_untouched() {
        assert_eq!(truncate_with_ellipsis("abcde", 5), "abcde");
    }
}
