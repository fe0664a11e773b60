//! Map viewport framing for drive routes.

use geo::{BoundingRect, Coord, MultiPoint, Point};

use crate::{is_valid_coordinate, LatLng};

/// Center used when there is nothing to frame (New Delhi).
pub const FALLBACK_CENTER: (f64, f64) = (28.6139, 77.2090);

/// Span of the fallback viewport, in degrees.
pub const FALLBACK_DELTA: f64 = 0.1;

/// Padding added to the data span on each axis, in degrees.
pub const REGION_MARGIN: f64 = 0.01;

/// Smallest delta a region may have, in degrees.
pub const MIN_REGION_DELTA: f64 = 0.01;

/// A map viewport: center plus latitude/longitude span.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Region shown when there are no coordinates at all.
    pub fn fallback() -> Self {
        Self {
            latitude: FALLBACK_CENTER.0,
            longitude: FALLBACK_CENTER.1,
            latitude_delta: FALLBACK_DELTA,
            longitude_delta: FALLBACK_DELTA,
        }
    }

    /// Whether a coordinate lies inside this viewport.
    pub fn contains<P: LatLng>(&self, p: &P) -> bool {
        (p.lat() - self.latitude).abs() <= self.latitude_delta / 2.0
            && (p.lng() - self.longitude).abs() <= self.longitude_delta / 2.0
    }
}

/// Compute a viewport that contains every coordinate.
///
/// Coordinates that are non-finite or out of range are skipped; when none
/// remain the result is [`MapRegion::fallback`]. Otherwise the center is the
/// midpoint of the bounding box and each delta is the box span plus
/// [`REGION_MARGIN`], never below [`MIN_REGION_DELTA`].
///
/// # Example
///
/// ```rust
/// use drive_telemetry::{GpsPoint, region::region_for_points};
///
/// let region = region_for_points(&[GpsPoint::new(51.5, -0.12)]);
/// assert_eq!(region.latitude, 51.5);
/// assert!(region.latitude_delta >= 0.01);
/// ```
pub fn region_for_points<P: LatLng>(points: &[P]) -> MapRegion {
    let multi: MultiPoint<f64> = points
        .iter()
        .filter(|p| is_valid_coordinate(p.lat(), p.lng()))
        .map(|p| Point::from(Coord { x: p.lng(), y: p.lat() }))
        .collect();

    let Some(rect) = multi.bounding_rect() else {
        return MapRegion::fallback();
    };

    let (min, max) = (rect.min(), rect.max());
    MapRegion {
        latitude: (min.y + max.y) / 2.0,
        longitude: (min.x + max.x) / 2.0,
        latitude_delta: (max.y - min.y + REGION_MARGIN).max(MIN_REGION_DELTA),
        longitude_delta: (max.x - min.x + REGION_MARGIN).max(MIN_REGION_DELTA),
    }
}
