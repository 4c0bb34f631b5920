//! Great-circle distance between coordinate pairs

use crate::models::Coordinate;

/// Earth radius used by the distance formula, in kilometers
pub const EARTH_RADIUS_KM: f64 = 6378.0;

/// Conversion factor from kilometers to miles
const MILES_PER_KM: f64 = 0.621_371;

/// Great-circle distance between two points in kilometers
///
/// Haversine formula: `a = sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)`,
/// `c = 2 · atan2(√a, √(1−a))`, distance `= R · c`.
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two points in miles
#[must_use]
pub fn distance_miles(from: Coordinate, to: Coordinate) -> f64 {
    distance_km(from, to) * MILES_PER_KM
}
