//! Privacy trimming of route endpoints.
//!
//! Before a drive is shared, the first and last stretch of the route can be cut
//! so the exact start and end locations (home, work) are not published. Both
//! stretches are measured by cumulative haversine distance, not by point count,
//! so the redaction is the same whatever the GPS sampling rate was.

use log::debug;

use crate::geo_utils::haversine_distance;
use crate::LatLng;

/// Trim `trim_meters` of travel from both ends of a route.
///
/// Walks forward from the start until the accumulated distance reaches the
/// threshold; that point becomes the new start. Walks backward from the end the
/// same way to find the new end.
///
/// The input is returned unchanged when:
/// - `trim_meters` is zero, negative or not finite,
/// - the route has fewer than 2 points,
/// - the two trims would meet or overlap (the route is no longer than twice
///   the threshold). Trimming never erases a whole trip.
///
/// # Example
///
/// ```rust
/// use drive_telemetry::{GpsPoint, trim::trim_route};
///
/// // ~111 m between consecutive points, ~555 m in total
/// let route: Vec<GpsPoint> = (0..6)
///     .map(|i| GpsPoint::new(28.6 + i as f64 * 0.001, 77.2))
///     .collect();
///
/// let trimmed = trim_route(&route, 150.0);
/// assert_eq!(trimmed, &route[2..=3]);
/// ```
pub fn trim_route<P: LatLng>(points: &[P], trim_meters: f64) -> &[P] {
    if !(trim_meters.is_finite() && trim_meters > 0.0) || points.len() < 2 {
        return points;
    }

    let last = points.len() - 1;

    let mut start = 0;
    let mut acc = 0.0;
    for i in 1..points.len() {
        acc += haversine_distance(&points[i - 1], &points[i]);
        if acc >= trim_meters {
            start = i;
            break;
        }
    }

    let mut end = last;
    acc = 0.0;
    for i in (1..points.len()).rev() {
        acc += haversine_distance(&points[i], &points[i - 1]);
        if acc >= trim_meters {
            end = i - 1;
            break;
        }
    }

    if end <= start {
        debug!(
            "[DriveTelemetry] Route of {} points too short to trim {:.0}m from each end",
            points.len(),
            trim_meters
        );
        return points;
    }

    &points[start..=end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::polyline_length;
    use crate::{GpsPoint, TrackPoint};

    /// Straight northward line, ~111.2 m per step.
    fn straight_route(n: usize) -> Vec<GpsPoint> {
        (0..n)
            .map(|i| GpsPoint::new(28.6 + i as f64 * 0.001, 77.2))
            .collect()
    }

    #[test]
    fn test_zero_threshold_is_identity() {
        let route = straight_route(5);
        assert_eq!(trim_route(&route, 0.0), &route[..]);
        assert_eq!(trim_route(&route, -10.0), &route[..]);
        assert_eq!(trim_route(&route, f64::NAN), &route[..]);
    }

    #[test]
    fn test_short_input_is_identity() {
        let empty: Vec<GpsPoint> = vec![];
        assert!(trim_route(&empty, 100.0).is_empty());

        let single = straight_route(1);
        assert_eq!(trim_route(&single, 100.0), &single[..]);
    }

    #[test]
    fn test_trims_one_segment_each_end() {
        let route = straight_route(5);
        let trimmed = trim_route(&route, 100.0);
        assert_eq!(trimmed, &route[1..=3]);
    }

    #[test]
    fn test_threshold_reached_exactly_counts() {
        let route = straight_route(6);
        let step = haversine_distance(&route[0], &route[1]);
        // Each walk crosses on the first segment when the threshold equals it
        let trimmed = trim_route(&route, step);
        assert_eq!(trimmed.first(), Some(&route[1]));
        assert!(trimmed.len() >= 3);
    }

    #[test]
    fn test_route_exactly_twice_threshold_is_unchanged() {
        // Two equal-length segments, trimming one segment's length from each end
        // makes the trims meet in the middle point
        let route = straight_route(3);
        let half = polyline_length(&route) / 2.0;
        assert_eq!(trim_route(&route, half), &route[..]);
    }

    #[test]
    fn test_route_shorter_than_threshold_is_unchanged() {
        let route = straight_route(4);
        assert_eq!(trim_route(&route, 5_000.0), &route[..]);
    }

    #[test]
    fn test_overlapping_trims_are_unchanged() {
        // ~333 m route, trimming 200 m from each end would overlap
        let route = straight_route(4);
        assert_eq!(trim_route(&route, 200.0), &route[..]);
    }

    #[test]
    fn test_trimmed_never_longer_than_input() {
        let route = straight_route(20);
        for threshold in [0.0, 50.0, 111.0, 250.0, 500.0, 999.0, 1_100.0, 10_000.0] {
            let trimmed = trim_route(&route, threshold);
            assert!(trimmed.len() <= route.len());
            assert!(trimmed.len() >= 2);
        }
    }

    #[test]
    fn test_trim_track_points_keeps_timestamps() {
        let route: Vec<TrackPoint> = (0..12)
            .map(|i| TrackPoint::new(28.6 + i as f64 * 0.001, 77.2, i as i64 * 1_000))
            .collect();
        let trimmed = trim_route(&route, 300.0);
        assert_eq!(trimmed.first().map(|p| p.timestamp_ms), Some(3_000));
        assert_eq!(trimmed.last().map(|p| p.timestamp_ms), Some(8_000));
    }
}
