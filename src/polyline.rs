//! Encoded polyline codec for drive routes.
//!
//! Routes are stored and shared as the widely used "encoded polyline" string
//! at precision 5 (coordinates scaled by 1e5, delta-encoded, printable ASCII).
//! The bit-level work is done by the `polyline` crate; this module converts
//! between [`LatLng`] points and `geo` coordinates (`x` = longitude,
//! `y` = latitude) and turns every failure into an empty result.
//!
//! The codec is lossy at 1e-5 degrees (about 1.1 m at the equator).
//!
//! Decoding is lenient: a corrupt or truncated string decodes to an empty route.
//! Callers treat an empty route as "nothing to draw".

use geo::Coord;
use log::debug;

use crate::{is_valid_coordinate, GpsPoint, LatLng};

/// Decimal digits kept by the encoding.
const PRECISION: u32 = 5;

/// Printable ASCII offset added to every 5-bit chunk.
const CHAR_OFFSET: u8 = 63;

/// Highest byte the encoding produces (`0x3f` chunk plus offset).
const MAX_CHAR: u8 = 126;

const CONTINUATION_BIT: u8 = 0x20;

/// Longest accepted chunk run for a single value. Real coordinate deltas need at
/// most 6 chunks.
const MAX_CHUNKS: usize = 12;

/// Encode an ordered coordinate sequence into a polyline string.
///
/// Empty input yields an empty string. So does any point that is non-finite or
/// outside the valid latitude/longitude range: a route that cannot be drawn is
/// not stored.
///
/// # Example
///
/// ```rust
/// use drive_telemetry::{GpsPoint, polyline};
///
/// let route = vec![
///     GpsPoint::new(38.5, -120.2),
///     GpsPoint::new(40.7, -120.95),
///     GpsPoint::new(43.252, -126.453),
/// ];
/// assert_eq!(polyline::encode(&route), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
///
/// assert_eq!(polyline::encode(&[GpsPoint::new(f64::NAN, 0.0)]), "");
/// ```
pub fn encode<P: LatLng>(points: &[P]) -> String {
    if let Some(bad) = points.iter().position(|p| !is_valid_coordinate(p.lat(), p.lng())) {
        debug!(
            "[DriveTelemetry] Not encoding route: point {} of {} is out of range",
            bad,
            points.len()
        );
        return String::new();
    }

    let coords = points.iter().map(|p| Coord { x: p.lng(), y: p.lat() });
    match ::polyline::encode_coordinates(coords, PRECISION) {
        Ok(line) => line,
        Err(e) => {
            debug!("[DriveTelemetry] Polyline encoding failed: {}", e);
            String::new()
        }
    }
}

/// Decode a polyline string back into coordinates.
///
/// Never fails: malformed input (bytes outside the encoding alphabet, a
/// truncated value, a latitude without its longitude, or a coordinate outside
/// the valid range) returns an empty vector.
///
/// # Example
///
/// ```rust
/// use drive_telemetry::polyline;
///
/// let route = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// assert_eq!(route.len(), 3);
/// assert!((route[2].longitude - (-126.453)).abs() < 1e-9);
///
/// assert!(polyline::decode("_p~iF").is_empty());
/// ```
pub fn decode(line: &str) -> Vec<GpsPoint> {
    if line.is_empty() {
        return Vec::new();
    }

    let decoded = if is_well_formed(line.as_bytes()) {
        ::polyline::decode_polyline(line, PRECISION).map_err(|e| e.to_string())
    } else {
        Err("truncated or outside the encoding alphabet".to_string())
    };

    let points: Result<Vec<GpsPoint>, String> = decoded.and_then(|ls| {
        ls.into_iter()
            .map(|c| GpsPoint::new(c.y, c.x))
            .map(|p| if p.is_valid() { Ok(p) } else { Err(format!("{:?} is out of range", p)) })
            .collect()
    });

    match points {
        Ok(points) => points,
        Err(e) => {
            debug!(
                "[DriveTelemetry] Discarding malformed polyline ({} bytes): {}",
                line.len(),
                e
            );
            Vec::new()
        }
    }
}

/// Decode many polylines at once, e.g. every card of a drive feed.
///
/// Output order matches input order. Runs on the rayon pool when the
/// `parallel` feature is enabled.
pub fn decode_many(lines: &[String]) -> Vec<Vec<GpsPoint>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        lines.par_iter().map(|line| decode(line)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        lines.iter().map(|line| decode(line)).collect()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Structural check run before decoding: every byte is in the alphabet, no
/// value runs past [`MAX_CHUNKS`], the last value is terminated, and values
/// come in latitude/longitude pairs.
fn is_well_formed(bytes: &[u8]) -> bool {
    let mut values = 0usize;
    let mut run = 0usize;

    for &byte in bytes {
        if !(CHAR_OFFSET..=MAX_CHAR).contains(&byte) {
            return false;
        }
        run += 1;
        if run > MAX_CHUNKS {
            return false;
        }
        if (byte - CHAR_OFFSET) & CONTINUATION_BIT == 0 {
            values += 1;
            run = 0;
        }
    }

    run == 0 && values % 2 == 0
}

// ============================================================================
// Tests
// ============================================================================
