//! Great-circle geometry on a spherical Earth.
//!
//! All distances are in meters and all angles in degrees. Functions are
//! pure and never fail; NaN inputs propagate NaN.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean Earth radius used by every distance computation.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in degrees.
///
/// Coordinates are plain values. Range checks live in
/// [`crate::validation::validate_coordinate`] so that evaluation code can
/// decide what to do with a bad fix instead of failing at construction.
///
/// # Example
///
/// ```rust
/// use zonewatch::core::Coordinate;
///
/// let home = Coordinate::new(51.5007, -0.1246);
/// let office = Coordinate::new(51.5033, -0.1196);
///
/// let meters = home.distance_to(&office);
/// assert!(meters > 400.0 && meters < 500.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without range checks.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Haversine distance to `other` in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance_meters(self, other)
    }

    /// Point reached by travelling `distance_meters` from here along the
    /// initial `bearing_degrees` (0 = north, 90 = east).
    pub fn destination(&self, bearing_degrees: f64, distance_meters: f64) -> Coordinate {
        let phi1 = to_radians(self.latitude);
        let lambda1 = to_radians(self.longitude);
        let theta = to_radians(bearing_degrees);
        let delta = distance_meters / EARTH_RADIUS_METERS;

        let phi2 =
            (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

        // Normalize longitude to [-180, 180].
        let longitude = (to_degrees(lambda2) + 540.0) % 360.0 - 180.0;
        Coordinate::new(to_degrees(phi2), longitude)
    }
}

/// Great-circle distance between `a` and `b` in meters.
///
/// Symmetric in its arguments and zero for identical points.
///
/// ```rust
/// use zonewatch::core::{distance_meters, Coordinate};
///
/// let origin = Coordinate::new(0.0, 0.0);
/// assert_eq!(distance_meters(&origin, &origin), 0.0);
///
/// // One degree of latitude is roughly 111 km.
/// let north = Coordinate::new(1.0, 0.0);
/// let d = distance_meters(&origin, &north);
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = to_radians(a.latitude);
    let phi2 = to_radians(b.latitude);
    let delta_phi = to_radians(b.latitude - a.latitude);
    let delta_lambda = to_radians(b.longitude - a.longitude);

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinate::new(48.8584, 2.2945);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(-33.8568, 151.2153);
        let b = Coordinate::new(40.6892, -74.0445);

        let ab = distance_meters(&a, &b);
        let ba = distance_meters(&b, &a);
        assert!((ab - ba).abs() < TOLERANCE);
    }

    #[test]
    fn quarter_meridian_matches_radius() {
        let equator = Coordinate::new(0.0, 0.0);
        let pole = Coordinate::new(90.0, 0.0);

        let expected = EARTH_RADIUS_METERS * PI / 2.0;
        assert!((distance_meters(&equator, &pole) - expected).abs() < 1e-3);
    }

    #[test]
    fn antipodes_are_half_circumference_apart() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);

        let expected = EARTH_RADIUS_METERS * PI;
        assert!((distance_meters(&a, &b) - expected).abs() < 1e-3);
    }

    #[test]
    fn distance_grows_with_separation() {
        let origin = Coordinate::new(10.0, 10.0);
        let near = Coordinate::new(10.001, 10.0);
        let far = Coordinate::new(10.01, 10.0);

        assert!(distance_meters(&origin, &near) < distance_meters(&origin, &far));
    }

    #[test]
    fn nan_input_propagates() {
        let a = Coordinate::new(f64::NAN, 0.0);
        let b = Coordinate::new(0.0, 0.0);
        assert!(distance_meters(&a, &b).is_nan());
    }

    #[test]
    fn destination_lands_at_requested_distance() {
        let origin = Coordinate::new(0.0, 0.0);

        for bearing in [0.0, 45.0, 90.0, 180.0, 270.0] {
            let p = origin.destination(bearing, 105.0);
            assert!((distance_meters(&origin, &p) - 105.0).abs() < 1e-6);
        }
    }

    #[test]
    fn destination_normalizes_longitude() {
        let near_dateline = Coordinate::new(0.0, 179.9999);
        let p = near_dateline.destination(90.0, 1_000.0);

        assert!(p.longitude < 0.0);
        assert!((-180.0..=180.0).contains(&p.longitude));
    }

    #[test]
    fn coordinate_serializes_with_named_fields() {
        let p = Coordinate::new(1.5, -2.25);
        let json = serde_json::to_value(p).unwrap();

        assert_eq!(json["latitude"], 1.5);
        assert_eq!(json["longitude"], -2.25);
    }
}
