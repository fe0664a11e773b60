//! Tokio driver for a live recording.
//!
//! A [`LiveSession`] runs two tasks against one [`SharedRecorder`]:
//! - a one-second ticker that refreshes the elapsed duration,
//! - a pump that feeds location fixes from a channel into the recorder.
//!
//! Both take the recorder lock for each step, so a fix is applied atomically and
//! a tick never interleaves with it. [`LiveSession::stop`] aborts both tasks
//! before it takes the final snapshot.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::recorder::{LiveStats, RecorderError, RecordingResult, TripRecorder};
use crate::TrackPoint;

/// Period of the duration ticker.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Recorder shared between the ticker, the sample pump and the UI.
pub type SharedRecorder = Arc<Mutex<TripRecorder>>;

/// Wrap a recorder for use with [`LiveSession`].
pub fn shared(recorder: TripRecorder) -> SharedRecorder {
    Arc::new(Mutex::new(recorder))
}

/// A running recording with its background tasks.
pub struct LiveSession {
    recorder: SharedRecorder,
    ticker: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Start recording and spawn the ticker and sample pump.
    ///
    /// Fails without spawning anything when the recorder declines to start
    /// (permission denied or already recording).
    pub async fn start(
        recorder: SharedRecorder,
        samples: mpsc::Receiver<TrackPoint>,
    ) -> Result<Self, RecorderError> {
        recorder.lock().await.start()?;

        let ticker = tokio::spawn(run_ticker(Arc::clone(&recorder)));
        let pump = tokio::spawn(run_pump(Arc::clone(&recorder), samples));
        info!("[DriveTelemetry] Live session running");

        Ok(Self {
            recorder,
            ticker: Some(ticker),
            pump: Some(pump),
        })
    }

    /// Halt the ticker and the pump, then stop the recorder.
    ///
    /// Only the first call returns a result.
    pub async fn stop(&mut self) -> Option<RecordingResult> {
        self.halt();
        self.recorder.lock().await.stop()
    }

    /// Halt background work and discard the session.
    pub async fn reset(&mut self) {
        self.halt();
        self.recorder.lock().await.reset();
    }

    pub async fn live_stats(&self) -> LiveStats {
        self.recorder.lock().await.live_stats()
    }

    pub fn recorder(&self) -> &SharedRecorder {
        &self.recorder
    }

    fn halt(&mut self) {
        let mut halted = false;
        for handle in [self.ticker.take(), self.pump.take()].into_iter().flatten() {
            handle.abort();
            halted = true;
        }
        if halted {
            debug!("[DriveTelemetry] Ticker and sample pump halted");
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.halt();
    }
}

async fn run_ticker(recorder: SharedRecorder) {
    let mut interval = tokio::time::interval(TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        if recorder.lock().await.tick().is_none() {
            break;
        }
    }
}

async fn run_pump(recorder: SharedRecorder, mut samples: mpsc::Receiver<TrackPoint>) {
    while let Some(point) = samples.recv().await {
        if !recorder.lock().await.ingest(point) {
            break;
        }
    }
    debug!("[DriveTelemetry] Sample pump finished");
}
