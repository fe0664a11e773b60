//! Trip finalization: authoritative statistics recomputed from raw points.
//!
//! The recorder keeps its own running totals while a drive is live. Those are
//! for the on-screen dashboard. What gets persisted is [`finalize`], which only
//! looks at the captured point list, so a stored trip can always be reproduced
//! from its points.

use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, speed_kmh_from_mps};
use crate::TrackPoint;

/// Summary of a completed trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TripStats {
    /// Total distance in meters
    pub distance_m: f64,
    /// First-to-last fix time in seconds, never negative
    pub duration_s: f64,
    /// Average speed in km/h (0 when duration is 0)
    pub avg_kmh: f64,
    /// Highest recorded instantaneous speed in km/h
    pub top_kmh: f64,
}

impl TripStats {
    /// True when the stats describe no movement at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Recompute trip statistics from a point list.
///
/// - Fewer than 2 points: every field is zero.
/// - Distance: haversine sum over consecutive points in list order.
/// - Duration: last minus first timestamp, clamped at zero so out-of-order
///   timestamps cannot produce a negative duration.
/// - Average: `distance / duration * 3.6`, or 0 for a zero duration.
/// - Top speed: highest `speed_mps` of any point (missing or negative counts
///   as 0), in km/h.
///
/// # Example
///
/// ```rust
/// use drive_telemetry::{TrackPoint, stats::finalize};
///
/// let points = vec![
///     TrackPoint::new(28.6139, 77.2090, 0).with_speed(0.0),
///     TrackPoint::new(28.6145, 77.2090, 10_000).with_speed(2.0),
///     TrackPoint::new(28.6150, 77.2090, 20_000).with_speed(3.0),
/// ];
/// let stats = finalize(&points);
/// assert_eq!(stats.duration_s, 20.0);
/// assert!((stats.top_kmh - 10.8).abs() < 1e-9);
/// ```
pub fn finalize(points: &[TrackPoint]) -> TripStats {
    if points.len() < 2 {
        return TripStats::default();
    }
    let first = &points[0];
    let last = &points[points.len() - 1];

    let distance_m: f64 = points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum();

    let top_mps = points
        .iter()
        .map(TrackPoint::effective_speed_mps)
        .fold(0.0, f64::max);

    let duration_s = (last.timestamp_ms - first.timestamp_ms).max(0) as f64 / 1000.0;
    let avg_kmh = if duration_s > 0.0 {
        speed_kmh_from_mps(distance_m / duration_s)
    } else {
        0.0
    };

    TripStats {
        distance_m,
        duration_s,
        avg_kmh,
        top_kmh: speed_kmh_from_mps(top_mps),
    }
}
