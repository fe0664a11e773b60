//! # Drive Telemetry
//!
//! Trip-telemetry engine for recording and sharing drives.
//!
//! This library provides:
//! - Live recording with running distance/speed figures
//! - Authoritative trip statistics recomputed from the raw points
//! - Privacy trimming of a route's start and end
//! - Encoded polyline transport for routes
//! - Map viewport framing
//!
//! ## Features
//!
//! - **`runtime`** (default) - Tokio ticker and sample pump for live sessions
//! - **`parallel`** - Decode many routes in parallel with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use drive_telemetry::{
//!     DriveRecord, DriveSettings, PermissionStatus, TrackPoint, TripRecorder, polyline,
//! };
//!
//! let mut recorder = TripRecorder::new(Box::new(|| PermissionStatus::Granted));
//! recorder.start().unwrap();
//!
//! for i in 0..20 {
//!     let fix = TrackPoint::new(28.6139 + i as f64 * 0.001, 77.2090, i * 8_000).with_speed(14.0);
//!     recorder.ingest(fix);
//! }
//!
//! let result = recorder.stop().unwrap();
//! println!("Drove {:.0}m, top {:.0} km/h", result.stats.distance_m, result.stats.top_kmh);
//!
//! let settings = DriveSettings { hide_start_end: true, trim_km: 0.5 };
//! let record = DriveRecord::from_recording(&result, &settings).unwrap();
//! assert!(polyline::decode(&record.polyline_shared).len() < result.points.len());
//! ```

use serde::{Deserialize, Serialize};

pub mod geo_utils;
pub mod polyline;
pub mod trim;
pub mod region;
pub mod stats;
pub mod recorder;
pub mod settings;
pub mod drive;
pub mod format;

#[cfg(feature = "runtime")]
pub mod runtime;

pub use drive::DriveRecord;
pub use recorder::{
    Clock, LiveAccumulator, LiveStats, LocationPermission, PermissionStatus, RecorderError,
    RecorderStatus, RecordingResult, SystemClock, TripRecorder,
};
pub use region::{region_for_points, MapRegion};
pub use settings::DriveSettings;
pub use stats::{finalize, TripStats};
pub use trim::trim_route;

#[cfg(feature = "runtime")]
pub use runtime::{LiveSession, SharedRecorder};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("DriveTelemetryRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// Anything with a latitude and longitude in degrees.
pub trait LatLng {
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;
}

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use drive_telemetry::GpsPoint;
/// let point = GpsPoint::new(28.6139, 77.2090); // New Delhi
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }
}

impl LatLng for GpsPoint {
    fn lat(&self) -> f64 {
        self.latitude
    }

    fn lng(&self) -> f64 {
        self.longitude
    }
}

/// One location fix from the device.
///
/// Captured fixes are never modified; the recorder only appends them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// Instantaneous speed in m/s, if the device reported one
    #[serde(default)]
    pub speed_mps: Option<f64>,
    /// Horizontal accuracy radius in meters
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl TrackPoint {
    /// Create a fix with no speed or accuracy information.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            speed_mps: None,
            accuracy_m: None,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Reported speed in m/s, with missing, negative or non-finite values read as 0.
    pub fn effective_speed_mps(&self) -> f64 {
        match self.speed_mps {
            Some(s) if s.is_finite() && s > 0.0 => s,
            _ => 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }

    pub fn to_gps_point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

impl LatLng for TrackPoint {
    fn lat(&self) -> f64 {
        self.latitude
    }

    fn lng(&self) -> f64 {
        self.longitude
    }
}

fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{debug, info};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    // ========================================================================
    // Permission Callback Interface (answered by the mobile app)
    // ========================================================================

    /// Callback interface for the location-permission prompt.
    /// Implement this in Kotlin/Swift; return true when access is granted.
    #[uniffi::export(callback_interface)]
    pub trait PermissionCallback: Send + Sync {
        fn request_foreground(&self) -> bool;
    }

    struct CallbackPermission(Box<dyn PermissionCallback>);

    impl LocationPermission for CallbackPermission {
        fn request_foreground(&self) -> PermissionStatus {
            if self.0.request_foreground() {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            }
        }
    }

    /// Recorder handle owned by the mobile app.
    ///
    /// Location callbacks and the UI timer may arrive on different threads;
    /// the mutex serializes them.
    #[derive(uniffi::Object)]
    pub struct FfiTripRecorder {
        inner: Mutex<TripRecorder>,
    }

    impl FfiTripRecorder {
        fn lock(&self) -> MutexGuard<'_, TripRecorder> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    #[uniffi::export]
    impl FfiTripRecorder {
        #[uniffi::constructor]
        pub fn new(permission: Box<dyn PermissionCallback>) -> Arc<Self> {
            init_logging();
            Arc::new(Self {
                inner: Mutex::new(TripRecorder::new(Box::new(CallbackPermission(permission)))),
            })
        }

        /// Returns false when the start was declined.
        pub fn start(&self) -> bool {
            match self.lock().start() {
                Ok(()) => true,
                Err(e) => {
                    info!("[DriveTelemetryRust] start declined: {}", e);
                    false
                }
            }
        }

        pub fn ingest(&self, point: TrackPoint) -> bool {
            self.lock().ingest(point)
        }

        pub fn tick(&self) -> Option<u64> {
            self.lock().tick()
        }

        pub fn stop(&self) -> Option<RecordingResult> {
            self.lock().stop()
        }

        pub fn reset(&self) {
            self.lock().reset();
        }

        pub fn status(&self) -> RecorderStatus {
            self.lock().status()
        }

        pub fn live_stats(&self) -> LiveStats {
            self.lock().live_stats()
        }
    }

    /// Encode a recorded track as a polyline string.
    #[uniffi::export]
    pub fn encode_route(points: Vec<TrackPoint>) -> String {
        init_logging();
        crate::polyline::encode(&points)
    }

    /// Decode a polyline string; malformed input gives an empty route.
    #[uniffi::export]
    pub fn decode_route(line: String) -> Vec<GpsPoint> {
        crate::polyline::decode(&line)
    }

    /// Decode a batch of polylines (feed cards), in parallel.
    #[uniffi::export]
    pub fn decode_routes(lines: Vec<String>) -> Vec<Vec<GpsPoint>> {
        init_logging();
        let start = std::time::Instant::now();
        let routes = crate::polyline::decode_many(&lines);
        debug!("[DriveTelemetryRust] Decoded {} routes in {:?}", routes.len(), start.elapsed());
        routes
    }

    /// Cut `trim_meters` from both ends of a track.
    #[uniffi::export]
    pub fn trim_track(points: Vec<TrackPoint>, trim_meters: f64) -> Vec<TrackPoint> {
        crate::trim::trim_route(&points, trim_meters).to_vec()
    }

    /// Viewport that frames a decoded route.
    #[uniffi::export]
    pub fn region_for_route(points: Vec<GpsPoint>) -> MapRegion {
        crate::region::region_for_points(&points)
    }

    /// Recompute trip statistics from raw points.
    #[uniffi::export]
    pub fn finalize_trip(points: Vec<TrackPoint>) -> TripStats {
        crate::stats::finalize(&points)
    }

    /// Build the persistence payload for a finished recording.
    #[uniffi::export]
    pub fn build_drive_record(result: RecordingResult, settings: DriveSettings) -> Option<DriveRecord> {
        init_logging();
        DriveRecord::from_recording(&result, &settings)
    }

    /// Parse stored settings JSON, falling back to defaults.
    #[uniffi::export]
    pub fn parse_settings(json: String) -> DriveSettings {
        DriveSettings::from_json(&json)
    }

    /// Get default settings.
    #[uniffi::export]
    pub fn default_settings() -> DriveSettings {
        DriveSettings::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
