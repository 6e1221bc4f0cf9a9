//! Frame loop host.

use std::future::Future;
use std::net::SocketAddr;

use parallax_core::{EyePosition, EyeState};
use parallax_renderer::{StereoFrame, StereoProjectionEngine, StereoStats};
use parallax_tracker::{EyeTrackingReceiver, ReceiverState, TrackerStatsSnapshot};
use serde::Serialize;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::MissedTickBehavior;

use crate::{AppConfig, AppError};

/// Periodic snapshot of tracker and projection health.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Frames produced so far.
    pub frames: u64,
    /// Sequence of the eye pair last rendered.
    pub sequence: u64,
    /// Current left eye position in centimetres.
    pub left: EyePosition,
    /// Current right eye position in centimetres.
    pub right: EyePosition,
    /// Eye midpoint on screen, in NDC.
    pub eye_marker: [f32; 2],
    /// Receiver lifecycle state.
    pub receiver: ReceiverState,
    /// Receiver counters.
    pub tracker: TrackerStatsSnapshot,
    /// Projection counters.
    pub projection: StereoStats,
}

/// Owns the eye tracking receiver and the projection engine.
///
/// There is no global state: the receiver and the engine share one
/// [`EyeState`] handed to both at construction.
#[derive(Debug)]
pub struct StereoApp {
    config: AppConfig,
    eyes: EyeState,
    engine: StereoProjectionEngine,
    receiver: EyeTrackingReceiver,
    frames: u64,
    degraded: bool,
}

impl StereoApp {
    /// Create the host. The receiver is not started yet.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] for invalid settings and
    /// [`AppError::Projection`] if the display cannot be projected.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;

        let eyes = EyeState::new();
        let engine = StereoProjectionEngine::new(config.display.clone(), eyes.clone())?;
        let receiver = EyeTrackingReceiver::new(config.tracker.clone(), eyes.clone());
        tracing::debug!(
            pixel_pitch_cm = engine.screen().pixel_pitch_cm,
            bind = %config.tracker.bind_addr,
            "Host configured"
        );

        Ok(Self {
            config,
            eyes,
            engine,
            receiver,
            frames: 0,
            degraded: false,
        })
    }

    /// Start receiving eye tracking packets.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Tracker`] if the socket cannot be bound or the
    /// receiver was already started.
    pub fn start(&mut self) -> Result<SocketAddr, AppError> {
        Ok(self.receiver.start()?)
    }

    /// Compute both eyes' matrices for one frame.
    pub fn run_frame(&mut self) -> StereoFrame {
        let frame = self.engine.frame();
        self.frames += 1;

        if frame.degraded != self.degraded {
            self.degraded = frame.degraded;
            if frame.degraded {
                tracing::warn!(sequence = frame.sequence, "Rendering with fallback projection");
            } else {
                tracing::info!(sequence = frame.sequence, "Projection recovered");
            }
        }

        tracing::trace!(
            frame = self.frames,
            sequence = frame.sequence,
            left_skew = frame.left.frustum.horizontal_skew(),
            right_skew = frame.right.frustum.horizontal_skew(),
            "Frame computed"
        );
        frame
    }

    /// Drive frames at the target rate until `shutdown` resolves or the
    /// frame limit is reached, then stop the receiver.
    ///
    /// Returns the total number of frames produced. Stopping joins the
    /// receive thread, which takes at most one tracker read timeout; on a
    /// multi-threaded runtime the join runs via `block_in_place`.
    pub async fn run<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut frame_tick = tokio::time::interval(self.config.frame_interval());
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let report_period = self.config.report_interval();
        let mut report_tick =
            tokio::time::interval_at(tokio::time::Instant::now() + report_period, report_period);
        report_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        tracing::info!(
            fps = self.config.target_fps,
            max_frames = ?self.config.max_frames,
            "Frame loop running"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                _ = frame_tick.tick() => {
                    self.run_frame();
                    if self.frame_limit_reached() {
                        tracing::info!(frames = self.frames, "Frame limit reached");
                        break;
                    }
                }
                _ = report_tick.tick() => self.report(),
            }
        }

        self.report();
        if Handle::current().runtime_flavor() == RuntimeFlavor::MultiThread {
            tokio::task::block_in_place(|| self.stop());
        } else {
            self.stop();
        }
        self.frames
    }

    /// Stop the receiver. Idempotent.
    pub fn stop(&mut self) {
        self.receiver.stop();
    }

    /// Collect a health snapshot.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        let pair = self.eyes.snapshot();
        HealthReport {
            frames: self.frames,
            sequence: self.engine.stats().last_sequence,
            left: pair.left,
            right: pair.right,
            eye_marker: self.engine.eye_marker(),
            receiver: self.receiver.state(),
            tracker: self.receiver.stats().snapshot(),
            projection: self.engine.stats().clone(),
        }
    }

    /// Log the current health snapshot.
    pub fn report(&self) {
        let health = self.health();
        tracing::info!(
            frames = health.frames,
            sequence = health.sequence,
            accepted = health.tracker.accepted,
            rejected = health.tracker.rejected,
            socket_errors = health.tracker.socket_errors,
            stale = health.tracker.stale,
            fallbacks = health.projection.fallbacks,
            marker_x = health.eye_marker[0],
            marker_y = health.eye_marker[1],
            "Tracker health"
        );

        match serde_json::to_string(&health) {
            Ok(json) => tracing::debug!(%json, "Health report"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize health report"),
        }
    }

    /// Frames produced so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Shared eye state fed by the receiver.
    #[must_use]
    pub const fn eye_state(&self) -> &EyeState {
        &self.eyes
    }

    /// The eye tracking receiver.
    #[must_use]
    pub const fn receiver(&self) -> &EyeTrackingReceiver {
        &self.receiver
    }

    /// The projection engine.
    #[must_use]
    pub const fn engine(&self) -> &StereoProjectionEngine {
        &self.engine
    }

    /// Mutable access to the engine, e.g. to move its camera.
    pub fn engine_mut(&mut self) -> &mut StereoProjectionEngine {
        &mut self.engine
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    fn frame_limit_reached(&self) -> bool {
        self.config.max_frames.is_some_and(|max| self.frames >= max)
    }
}
