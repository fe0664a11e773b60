//! The saved-drive payload handed to the persistence layer.

use log::info;
use serde::{Deserialize, Serialize};

use crate::polyline;
use crate::recorder::RecordingResult;
use crate::settings::DriveSettings;
use crate::trim::trim_route;

/// One drive as the backend stores it.
///
/// Figures come from the finalized stats, never the live dashboard, so the row
/// can be rebuilt from `polyline_raw` plus the fix timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct DriveRecord {
    /// Timestamp of the first fix (ms since epoch)
    pub started_at_ms: i64,
    /// Timestamp of the last fix (ms since epoch)
    pub ended_at_ms: i64,
    pub duration_s: i64,
    pub distance_m: i64,
    /// km/h, two decimals
    pub avg_kmh: f64,
    /// km/h, two decimals
    pub top_kmh: f64,
    /// Full route
    pub polyline_raw: String,
    /// Route as shown to others (trimmed when `hide_start_end`)
    pub polyline_shared: String,
    pub hide_start_end: bool,
}

impl DriveRecord {
    /// Build the record for a finished recording.
    ///
    /// Returns `None` for a trip with fewer than two points.
    pub fn from_recording(result: &RecordingResult, settings: &DriveSettings) -> Option<Self> {
        if result.is_discardable() {
            return None;
        }
        let first = result.points.first()?;
        let last = result.points.last()?;

        let polyline_raw = polyline::encode(&result.points);
        let trim_meters = settings.trim_meters();
        let polyline_shared = if trim_meters > 0.0 {
            polyline::encode(trim_route(&result.points, trim_meters))
        } else {
            polyline_raw.clone()
        };

        let stats = &result.stats;
        let record = Self {
            started_at_ms: first.timestamp_ms,
            ended_at_ms: last.timestamp_ms,
            duration_s: stats.duration_s.round() as i64,
            distance_m: stats.distance_m.round() as i64,
            avg_kmh: round2(stats.avg_kmh),
            top_kmh: round2(stats.top_kmh),
            polyline_raw,
            polyline_shared,
            hide_start_end: settings.hide_start_end,
        };

        info!(
            "[DriveTelemetry] Drive record: {}m in {}s, raw {} bytes, shared {} bytes",
            record.distance_m,
            record.duration_s,
            record.polyline_raw.len(),
            record.polyline_shared.len()
        );
        Some(record)
    }

    /// The route to draw for viewers: shared if present, else raw.
    pub fn display_polyline(&self) -> &str {
        if self.polyline_shared.is_empty() {
            &self.polyline_raw
        } else {
            &self.polyline_shared
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
