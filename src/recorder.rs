//! Live drive recording.
//!
//! [`TripRecorder`] owns the one active session. It moves through three states:
//!
//! ```text
//!   Idle ──start()──▶ Recording ──stop()──▶ Stopped
//!    ▲                    │                    │
//!    └──────reset()───────┴───────reset()──────┘
//!                    (start() also leaves Stopped)
//! ```
//!
//! While recording, every incoming fix goes through [`LiveAccumulator`], which
//! keeps the dashboard figures (distance, current and top speed) up to date in a
//! single step per sample. At stop the captured points are handed to
//! [`crate::stats::finalize`], which recomputes the figures from scratch. Both
//! are returned so callers can cross-check them.
//!
//! Location permission and wall-clock time are injected through the
//! [`LocationPermission`] and [`Clock`] traits, so the recorder runs without any
//! location hardware.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo_utils::{haversine_distance, speed_kmh_from_mps};
use crate::stats::{finalize, TripStats};
use crate::TrackPoint;

// ============================================================================
// Injected capabilities
// ============================================================================

/// Answer from the platform's location-permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Grants or denies foreground location access when a recording starts.
pub trait LocationPermission: Send + Sync {
    fn request_foreground(&self) -> PermissionStatus;
}

impl<F> LocationPermission for F
where
    F: Fn() -> PermissionStatus + Send + Sync,
{
    fn request_foreground(&self) -> PermissionStatus {
        self()
    }
}

/// Wall-clock source, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// [`Clock`] backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Why a recording could not start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("a recording is already in progress")]
    AlreadyRecording,
}

// ============================================================================
// Live accumulation
// ============================================================================

/// Running distance and speed figures, updated one sample at a time.
///
/// Shares nothing with [`finalize`] except the haversine primitive, so the two
/// can be checked against each other.
#[derive(Debug, Clone, Default)]
pub struct LiveAccumulator {
    distance_m: f64,
    top_kmh: f64,
    current_kmh: f64,
    point_count: u32,
    last: Option<TrackPoint>,
}

impl LiveAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample in and return the distance it added, in meters.
    ///
    /// The first sample only seeds the previous point. Speeds come from every
    /// sample: a missing or non-positive speed reads as 0 km/h and only a
    /// positive one can raise the top speed.
    pub fn push(&mut self, point: &TrackPoint) -> f64 {
        let delta = match &self.last {
            Some(prev) => haversine_distance(prev, point),
            None => 0.0,
        };
        self.distance_m += delta;

        let kmh = speed_kmh_from_mps(point.effective_speed_mps());
        self.current_kmh = kmh;
        if kmh > 0.0 {
            self.top_kmh = self.top_kmh.max(kmh);
        }

        self.point_count += 1;
        self.last = Some(*point);
        delta
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn top_kmh(&self) -> f64 {
        self.top_kmh
    }

    pub fn current_kmh(&self) -> f64 {
        self.current_kmh
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }
}

/// Dashboard figures of the live session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LiveStats {
    pub distance_m: f64,
    pub top_kmh: f64,
    pub current_kmh: f64,
    /// Whole seconds of wall-clock time since start
    pub duration_s: u64,
    pub point_count: u32,
}

impl LiveStats {
    /// Average speed over the wall-clock duration, in km/h.
    pub fn avg_kmh(&self) -> f64 {
        if self.duration_s == 0 {
            return 0.0;
        }
        speed_kmh_from_mps(self.distance_m / self.duration_s as f64)
    }
}

/// Everything a finished recording hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RecordingResult {
    /// The full point log, in capture order
    pub points: Vec<TrackPoint>,
    /// Figures accumulated while recording
    pub live: LiveStats,
    /// Figures recomputed from `points`
    pub stats: TripStats,
}

impl RecordingResult {
    /// A trip with fewer than two fixes has no route worth keeping.
    pub fn is_discardable(&self) -> bool {
        self.points.len() < 2
    }
}

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug)]
struct Session {
    started_at_ms: i64,
    duration_s: u64,
    points: Vec<TrackPoint>,
    live: LiveAccumulator,
}

impl Session {
    fn new(started_at_ms: i64) -> Self {
        Self {
            started_at_ms,
            duration_s: 0,
            points: Vec::new(),
            live: LiveAccumulator::new(),
        }
    }

    fn elapsed_s(&self, now_ms: i64) -> u64 {
        ((now_ms - self.started_at_ms).max(0) / 1000) as u64
    }

    fn live_stats(&self) -> LiveStats {
        LiveStats {
            distance_m: self.live.distance_m(),
            top_kmh: self.live.top_kmh(),
            current_kmh: self.live.current_kmh(),
            duration_s: self.duration_s,
            point_count: self.live.point_count(),
        }
    }
}

#[derive(Debug)]
enum RecorderState {
    Idle,
    Recording(Session),
    Stopped,
}

/// Observable lifecycle state of a [`TripRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum RecorderStatus {
    Idle,
    Recording,
    Stopped,
}

/// Owner of the live recording session.
///
/// Not meant to be driven from several threads at once; wrap it in a mutex
/// (see `runtime::SharedRecorder`) when samples and ticks arrive on different
/// tasks.
pub struct TripRecorder {
    state: RecorderState,
    permission: Box<dyn LocationPermission>,
    clock: Arc<dyn Clock>,
}

impl TripRecorder {
    /// Create an idle recorder using the system clock.
    pub fn new(permission: Box<dyn LocationPermission>) -> Self {
        Self::with_clock(permission, Arc::new(SystemClock))
    }

    /// Create an idle recorder with a custom clock.
    pub fn with_clock(permission: Box<dyn LocationPermission>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RecorderState::Idle,
            permission,
            clock,
        }
    }

    pub fn status(&self) -> RecorderStatus {
        match self.state {
            RecorderState::Idle => RecorderStatus::Idle,
            RecorderState::Recording(_) => RecorderStatus::Recording,
            RecorderState::Stopped => RecorderStatus::Stopped,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording(_))
    }

    /// Begin a new session.
    ///
    /// Valid from Idle or Stopped. Asks for location permission first; on
    /// denial nothing changes and [`RecorderError::PermissionDenied`] is
    /// returned.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if self.is_recording() {
            warn!("[DriveTelemetry] start() ignored: already recording");
            return Err(RecorderError::AlreadyRecording);
        }

        if self.permission.request_foreground() != PermissionStatus::Granted {
            warn!("[DriveTelemetry] Location permission denied, not recording");
            return Err(RecorderError::PermissionDenied);
        }

        let now = self.clock.now_ms();
        self.state = RecorderState::Recording(Session::new(now));
        info!("[DriveTelemetry] Recording started at {}", now);
        Ok(())
    }

    /// Feed one location fix into the active session.
    ///
    /// Returns `false` (and does nothing) unless recording.
    pub fn ingest(&mut self, point: TrackPoint) -> bool {
        let RecorderState::Recording(session) = &mut self.state else {
            trace!("[DriveTelemetry] Dropping fix received while not recording");
            return false;
        };

        session.live.push(&point);
        session.points.push(point);
        true
    }

    /// Refresh the elapsed duration from the clock.
    ///
    /// Returns the new duration in seconds, or `None` when not recording.
    /// Duration follows wall-clock time, so it keeps advancing through GPS
    /// dropouts.
    pub fn tick(&mut self) -> Option<u64> {
        let now = self.clock.now_ms();
        match &mut self.state {
            RecorderState::Recording(session) => {
                session.duration_s = session.elapsed_s(now);
                Some(session.duration_s)
            }
            _ => None,
        }
    }

    /// Finish the session.
    ///
    /// Moves Recording to Stopped and returns the point log with both the live
    /// and the finalized figures. Any other state returns `None`, so a repeated
    /// stop is harmless.
    pub fn stop(&mut self) -> Option<RecordingResult> {
        if !self.is_recording() {
            debug!("[DriveTelemetry] stop() ignored: not recording");
            return None;
        }
        let RecorderState::Recording(mut session) =
            std::mem::replace(&mut self.state, RecorderState::Stopped)
        else {
            return None;
        };

        session.duration_s = session.elapsed_s(self.clock.now_ms());
        let mut live = session.live_stats();
        live.current_kmh = 0.0;

        let stats = finalize(&session.points);
        info!(
            "[DriveTelemetry] Recording stopped: {} points, live {:.0}m / final {:.0}m in {}s",
            session.points.len(),
            live.distance_m,
            stats.distance_m,
            live.duration_s
        );

        Some(RecordingResult {
            points: session.points,
            live,
            stats,
        })
    }

    /// Drop all session state and return to Idle. Valid from any state.
    pub fn reset(&mut self) {
        if self.is_recording() {
            info!("[DriveTelemetry] Discarding active recording");
        }
        self.state = RecorderState::Idle;
    }

    /// Current dashboard figures; zeroes when not recording.
    pub fn live_stats(&self) -> LiveStats {
        match &self.state {
            RecorderState::Recording(session) => session.live_stats(),
            _ => LiveStats::default(),
        }
    }

    /// Points captured so far in the active session.
    pub fn points(&self) -> &[TrackPoint] {
        match &self.state {
            RecorderState::Recording(session) => &session.points,
            _ => &[],
        }
    }
}

impl std::fmt::Debug for TripRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripRecorder")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock the test moves by hand.
    #[derive(Debug, Default)]
    pub(crate) struct ManualClock(AtomicI64);

    impl ManualClock {
        pub(crate) fn advance(&self, ms: i64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn granted() -> Box<dyn LocationPermission> {
        Box::new(|| PermissionStatus::Granted)
    }

    fn recorder() -> (TripRecorder, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (TripRecorder::with_clock(granted(), clock.clone()), clock)
    }

    fn sample_drive() -> Vec<TrackPoint> {
        (0..30)
            .map(|i| {
                let f = i as f64;
                TrackPoint::new(28.6139 + f * 0.0004, 77.2090 + (f * 0.3).sin() * 0.0003, i * 2_000)
                    .with_speed(8.0 + (f * 0.7).cos() * 5.0)
            })
            .collect()
    }

    #[test]
    fn test_starts_idle() {
        let (rec, _) = recorder();
        assert_eq!(rec.status(), RecorderStatus::Idle);
        assert_eq!(rec.live_stats(), LiveStats::default());
        assert!(rec.points().is_empty());
    }

    #[test]
    fn test_permission_denied_does_not_transition() {
        let mut rec = TripRecorder::new(Box::new(|| PermissionStatus::Denied));
        assert_eq!(rec.start(), Err(RecorderError::PermissionDenied));
        assert_eq!(rec.status(), RecorderStatus::Idle);
        assert!(!rec.ingest(TrackPoint::new(1.0, 1.0, 0)));
    }

    #[test]
    fn test_start_while_recording_is_declined() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        rec.ingest(TrackPoint::new(28.6139, 77.2090, 0));
        assert_eq!(rec.start(), Err(RecorderError::AlreadyRecording));
        assert_eq!(rec.points().len(), 1);
    }

    #[test]
    fn test_ingest_ignored_unless_recording() {
        let (mut rec, _) = recorder();
        assert!(!rec.ingest(TrackPoint::new(1.0, 1.0, 0)));
        rec.start().unwrap();
        assert!(rec.ingest(TrackPoint::new(1.0, 1.0, 0)));
        rec.stop();
        assert!(!rec.ingest(TrackPoint::new(1.0, 1.001, 1_000)));
        assert_eq!(rec.status(), RecorderStatus::Stopped);
    }

    #[test]
    fn test_first_sample_adds_no_distance() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        rec.ingest(TrackPoint::new(28.6139, 77.2090, 0).with_speed(5.0));
        let live = rec.live_stats();
        assert_eq!(live.distance_m, 0.0);
        assert_eq!(live.point_count, 1);
        assert!((live.current_kmh - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_is_monotonic() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        let mut previous = 0.0;
        for p in sample_drive() {
            rec.ingest(p);
            let d = rec.live_stats().distance_m;
            assert!(d >= previous);
            previous = d;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn test_current_speed_can_drop_top_speed_cannot() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        rec.ingest(TrackPoint::new(28.6139, 77.2090, 0).with_speed(10.0));
        rec.ingest(TrackPoint::new(28.6145, 77.2090, 1_000).with_speed(4.0));
        rec.ingest(TrackPoint::new(28.6150, 77.2090, 2_000));
        let live = rec.live_stats();
        assert_eq!(live.current_kmh, 0.0);
        assert!((live.top_kmh - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_follows_clock_without_samples() {
        let (mut rec, clock) = recorder();
        assert_eq!(rec.tick(), None);
        rec.start().unwrap();
        clock.advance(999);
        assert_eq!(rec.tick(), Some(0));
        clock.advance(1);
        assert_eq!(rec.tick(), Some(1));
        clock.advance(59_500);
        assert_eq!(rec.tick(), Some(60));
        assert_eq!(rec.live_stats().duration_s, 60);
    }

    #[test]
    fn test_stop_returns_points_and_both_stats() {
        let (mut rec, clock) = recorder();
        rec.start().unwrap();
        let drive = sample_drive();
        for p in &drive {
            rec.ingest(*p);
        }
        clock.advance(58_000);

        let result = rec.stop().unwrap();
        assert_eq!(rec.status(), RecorderStatus::Stopped);
        assert_eq!(result.points, drive);
        assert_eq!(result.live.duration_s, 58);
        assert_eq!(result.live.current_kmh, 0.0);
        assert_eq!(result.stats, finalize(&drive));
        assert!(!result.is_discardable());
    }

    #[test]
    fn test_live_and_final_distance_agree() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        for p in sample_drive() {
            rec.ingest(p);
        }
        let result = rec.stop().unwrap();
        let rel = (result.live.distance_m - result.stats.distance_m).abs() / result.stats.distance_m;
        assert!(rel < 1e-6);
        assert!((result.live.top_kmh - result.stats.top_kmh).abs() < 1e-9);
    }

    #[test]
    fn test_accumulator_matches_finalize() {
        let drive = sample_drive();
        for n in 0..drive.len() {
            let slice = &drive[..n];
            let mut acc = LiveAccumulator::new();
            for p in slice {
                acc.push(p);
            }
            let stats = finalize(slice);
            let tolerance = 1e-6 * stats.distance_m.max(1.0);
            assert!((acc.distance_m() - stats.distance_m).abs() <= tolerance);
        }
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut rec, _) = recorder();
        assert!(rec.stop().is_none());
        assert_eq!(rec.status(), RecorderStatus::Idle);

        rec.start().unwrap();
        assert!(rec.stop().is_some());
        assert!(rec.stop().is_none());
        assert_eq!(rec.status(), RecorderStatus::Stopped);
    }

    #[test]
    fn test_stop_without_samples_is_discardable() {
        let (mut rec, _) = recorder();
        rec.start().unwrap();
        let result = rec.stop().unwrap();
        assert!(result.is_discardable());
        assert!(result.stats.is_empty());
    }

    #[test]
    fn test_restart_after_stop_clears_counters() {
        let (mut rec, clock) = recorder();
        rec.start().unwrap();
        for p in sample_drive() {
            rec.ingest(p);
        }
        clock.advance(10_000);
        rec.tick();
        rec.stop();

        rec.start().unwrap();
        assert_eq!(rec.status(), RecorderStatus::Recording);
        assert_eq!(rec.live_stats(), LiveStats::default());
        assert!(rec.points().is_empty());
    }

    #[test]
    fn test_reset_from_any_state() {
        let (mut rec, _) = recorder();
        rec.reset();
        assert_eq!(rec.status(), RecorderStatus::Idle);

        rec.start().unwrap();
        rec.ingest(TrackPoint::new(1.0, 1.0, 0));
        rec.reset();
        assert_eq!(rec.status(), RecorderStatus::Idle);
        assert!(rec.points().is_empty());
        assert!(rec.stop().is_none());

        rec.start().unwrap();
        rec.stop();
        rec.reset();
        assert_eq!(rec.status(), RecorderStatus::Idle);
    }

    #[test]
    fn test_live_avg_kmh() {
        let live = LiveStats { distance_m: 1_000.0, duration_s: 100, ..LiveStats::default() };
        assert!((live.avg_kmh() - 36.0).abs() < 1e-9);
        assert_eq!(LiveStats::default().avg_kmh(), 0.0);
    }
}
