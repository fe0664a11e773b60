//! # Geographic Utilities
//!
//! Core geodesy for drive telemetry.
//!
//! Everything else in the crate (live accumulation, trip finalization, privacy
//! trimming) measures distance through [`haversine_distance`], so the live and
//! batch figures stay comparable.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two coordinates |
//! | [`speed_kmh_from_mps`] | Meters/second to kilometers/hour |
//! | [`polyline_length`] | Total length of a track in meters |
//!
//! ## Example
//!
//! ```rust
//! use drive_telemetry::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(28.6139, 77.2090),  // New Delhi
//!     GpsPoint::new(28.6145, 77.2090),
//!     GpsPoint::new(28.6150, 77.2090),
//! ];
//!
//! let length = geo_utils::polyline_length(&track);
//! assert!((length - 122.3).abs() < 0.5);
//! ```
//!
//! ## Algorithm Notes
//!
//! The haversine formula calculates the great-circle distance between two points on a
//! sphere. Distances come from `geo`'s [`HaversineMeasure`] with a fixed radius of
//! 6,371,000 m so that stored trip distances are reproducible across platforms.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use geo::{Distance, HaversineMeasure, Point};

use crate::LatLng;

/// Mean Earth radius used for all distance math, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine metric on a sphere of radius [`EARTH_RADIUS_M`].
const EARTH: HaversineMeasure = HaversineMeasure::new(EARTH_RADIUS_M);

/// Multiplier from meters/second to kilometers/hour.
pub const MPS_TO_KMH: f64 = 3.6;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two coordinates using the Haversine formula.
///
/// Returns meters along a sphere of radius [`EARTH_RADIUS_M`]. Latitudes outside
/// [-90, 90] are clamped into range; longitude needs no clamping because the formula
/// is periodic in it. Non-finite input yields `0.0` instead of NaN, so a single bad
/// fix cannot poison a running total.
///
/// # Example
///
/// ```rust
/// use drive_telemetry::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(28.6139, 77.2090);
/// let b = GpsPoint::new(28.6145, 77.2090);
///
/// let distance = geo_utils::haversine_distance(&a, &b);
/// assert!((distance - 66.7).abs() < 0.5);
/// ```
#[inline]
pub fn haversine_distance<A: LatLng + ?Sized, B: LatLng + ?Sized>(a: &A, b: &B) -> f64 {
    let (lat1, lng1) = (a.lat(), a.lng());
    let (lat2, lng2) = (b.lat(), b.lng());
    if !(lat1.is_finite() && lng1.is_finite() && lat2.is_finite() && lng2.is_finite()) {
        return 0.0;
    }

    let origin = Point::new(lng1, lat1.clamp(-90.0, 90.0));
    let destination = Point::new(lng2, lat2.clamp(-90.0, 90.0));
    EARTH.distance(origin, destination)
}

/// Convert a speed in meters/second to kilometers/hour.
#[inline]
pub fn speed_kmh_from_mps(mps: f64) -> f64 {
    mps * MPS_TO_KMH
}

/// Calculate the total length of a track in meters.
///
/// Sums the haversine distance between consecutive points. Empty or single-point
/// tracks return 0.0.
///
/// # Example
///
/// ```rust
/// use drive_telemetry::{GpsPoint, geo_utils};
///
/// let single = vec![GpsPoint::new(51.5074, -0.1278)];
/// assert_eq!(geo_utils::polyline_length(&single), 0.0);
/// ```
pub fn polyline_length<P: LatLng>(points: &[P]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpsPoint, TrackPoint};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_500.0, 5000.0));
    }

    #[test]
    fn test_haversine_one_millidegree_north() {
        // 0.001 deg of latitude on a 6371 km sphere is 111.19 m
        let a = GpsPoint::new(10.0, 20.0);
        let b = GpsPoint::new(10.001, 20.0);
        assert!(approx_eq(haversine_distance(&a, &b), 111.195, 0.01));
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = GpsPoint::new(28.6139, 77.2090);
        let b = GpsPoint::new(19.0760, 72.8777);
        assert!(approx_eq(haversine_distance(&a, &b), haversine_distance(&b, &a), 1e-6));
    }

    #[test]
    fn test_haversine_antipodal_is_finite() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0, 180.0);
        let d = haversine_distance(&a, &b);
        assert!(d.is_finite());
        assert!(approx_eq(d, std::f64::consts::PI * EARTH_RADIUS_M, 1.0));
    }

    #[test]
    fn test_haversine_uses_fixed_radius() {
        // One degree along the equator is R * pi / 180, not geo's default mean radius
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0, 1.0);
        assert!(approx_eq(haversine_distance(&a, &b), EARTH_RADIUS_M.to_radians(), 1e-6));
    }

    #[test]
    fn test_haversine_out_of_range_latitude_is_clamped() {
        let pole = GpsPoint::new(90.0, 0.0);
        let beyond = GpsPoint::new(95.0, 0.0);
        assert_eq!(haversine_distance(&pole, &beyond), 0.0);
    }

    #[test]
    fn test_haversine_non_finite_is_zero() {
        let a = GpsPoint::new(f64::NAN, 0.0);
        let b = GpsPoint::new(1.0, 1.0);
        assert_eq!(haversine_distance(&a, &b), 0.0);
    }

    #[test]
    fn test_haversine_mixed_point_types() {
        let a = GpsPoint::new(28.6139, 77.2090);
        let b = TrackPoint::new(28.6145, 77.2090, 0);
        assert!(approx_eq(haversine_distance(&a, &b), 66.7, 0.5));
    }

    #[test]
    fn test_speed_conversion() {
        assert_eq!(speed_kmh_from_mps(0.0), 0.0);
        assert!(approx_eq(speed_kmh_from_mps(3.0), 10.8, 1e-9));
        assert!(approx_eq(speed_kmh_from_mps(27.7778), 100.0, 0.001));
    }

    #[test]
    fn test_polyline_length_empty() {
        let empty: Vec<GpsPoint> = vec![];
        assert_eq!(polyline_length(&empty), 0.0);
    }

    #[test]
    fn test_polyline_length_two_points() {
        let track = vec![
            GpsPoint::new(51.5074, -0.1278),
            GpsPoint::new(51.5080, -0.1280),
        ];
        let length = polyline_length(&track);
        assert!(length > 0.0);
        assert!(length < 100.0);
    }
}
