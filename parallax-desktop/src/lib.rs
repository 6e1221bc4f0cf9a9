//! # Parallax Desktop
//!
//! Headless host for eye-tracked stereo rendering.
//!
//! Starts the UDP eye tracking receiver, then drives a frame loop that asks
//! the projection engine for both eyes' matrices at the configured rate and
//! periodically reports tracker health. A render backend would consume the
//! per-frame [`StereoFrame`](parallax_renderer::StereoFrame) output.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p parallax-desktop
//! ```
//!
//! ## With a config file and overrides:
//!
//! ```bash
//! cargo run -p parallax-desktop -- --config parallax.json --bind 0.0.0.0:6768 --fps 120
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `AppConfig` - Display, tracker and loop settings from JSON plus CLI overrides
//! - `StereoApp` - Owns the receiver and the projection engine, runs the loop

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod app;

pub use app::{HealthReport, StereoApp};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use parallax_core::{load_json, ConfigError, ConfigResult, DisplayConfig};
use parallax_renderer::ProjectionError;
use parallax_tracker::{TrackerConfig, TrackerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest frame rate the loop accepts.
pub const MAX_TARGET_FPS: u32 = 1_000;

/// Longest accepted gap between health reports (one day).
pub const MAX_REPORT_INTERVAL_SECS: u64 = 86_400;

/// Command-line arguments for parallax-desktop.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "parallax-desktop")]
#[command(about = "Eye-tracked off-axis stereo projection host")]
#[command(version)]
pub struct CliArgs {
    /// JSON configuration file. CLI flags override its values.
    #[arg(long, env = "PARALLAX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Local UDP endpoint for eye tracker packets
    #[arg(long, env = "PARALLAX_BIND")]
    pub bind: Option<SocketAddr>,

    /// Screen diagonal in inches
    #[arg(long, env = "PARALLAX_SCREEN_DIAGONAL")]
    pub screen_diagonal: Option<f32>,

    /// Horizontal resolution in pixels
    #[arg(long, env = "PARALLAX_RESOLUTION_WIDTH")]
    pub resolution_width: Option<u32>,

    /// Vertical resolution in pixels
    #[arg(long, env = "PARALLAX_RESOLUTION_HEIGHT")]
    pub resolution_height: Option<u32>,

    /// Multiplier applied to eye positions and screen extents
    #[arg(long, env = "PARALLAX_SCALE")]
    pub parallax_scale: Option<f32>,

    /// Virtual camera depth offset in centimetres
    #[arg(long, env = "PARALLAX_CAMERA_OFFSET_Z")]
    pub camera_offset_z: Option<f32>,

    /// Pause after each accepted packet, in milliseconds
    #[arg(long, env = "PARALLAX_PACKET_DELAY_MS")]
    pub packet_delay_ms: Option<u64>,

    /// Target frame rate
    #[arg(long, env = "PARALLAX_FPS")]
    pub fps: Option<u32>,

    /// Stop after this many frames instead of running until Ctrl-C
    #[arg(long, env = "PARALLAX_FRAMES")]
    pub frames: Option<u64>,

    /// Seconds between health reports
    #[arg(long, env = "PARALLAX_REPORT_INTERVAL")]
    pub report_interval: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "PARALLAX_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

/// Errors from setting up or running the host.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The display geometry cannot be projected.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// The eye tracking receiver failed.
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Physical display and projection settings.
    pub display: DisplayConfig,
    /// Eye tracking receiver settings.
    pub tracker: TrackerConfig,
    /// Frames per second the loop aims for.
    pub target_fps: u32,
    /// Seconds between health reports.
    pub report_interval_secs: u64,
    /// Stop after this many frames. `None` runs until shutdown.
    pub max_frames: Option<u64>,
    /// Prometheus listener address, if metrics should be exported.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            tracker: TrackerConfig::default(),
            target_fps: 60,
            report_interval_secs: 5,
            max_frames: None,
            metrics_addr: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from an optional file plus CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or if
    /// the merged result fails validation.
    pub fn from_args(args: &CliArgs) -> ConfigResult<Self> {
        let mut config = match &args.config {
            Some(path) => load_json(path)?,
            None => Self::default(),
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    /// Replace values with those given on the command line.
    pub fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(bind) = args.bind {
            self.tracker.bind_addr = bind;
        }
        if let Some(delay) = args.packet_delay_ms {
            self.tracker.packet_delay_ms = delay;
        }
        if let Some(diagonal) = args.screen_diagonal {
            self.display.screen_diagonal_in = diagonal;
        }
        if let Some(width) = args.resolution_width {
            self.display.resolution_width_px = width;
        }
        if let Some(height) = args.resolution_height {
            self.display.resolution_height_px = height;
        }
        if let Some(scale) = args.parallax_scale {
            self.display.parallax_scale = scale;
        }
        if let Some(offset) = args.camera_offset_z {
            self.display.virtual_camera_offset_z_cm = offset;
        }
        if let Some(fps) = args.fps {
            self.target_fps = fps;
        }
        if let Some(frames) = args.frames {
            self.max_frames = Some(frames);
        }
        if let Some(interval) = args.report_interval {
            self.report_interval_secs = interval;
        }
        if let Some(addr) = args.metrics_addr {
            self.metrics_addr = Some(addr);
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        self.display.validate()?;
        self.tracker.validate()?;
        if !(1..=MAX_TARGET_FPS).contains(&self.target_fps) {
            return Err(ConfigError::Invalid(format!(
                "target_fps must be in 1..={MAX_TARGET_FPS}, got {}",
                self.target_fps
            )));
        }
        if !(1..=MAX_REPORT_INTERVAL_SECS).contains(&self.report_interval_secs) {
            return Err(ConfigError::Invalid(format!(
                "report_interval_secs must be in 1..={MAX_REPORT_INTERVAL_SECS}, got {}",
                self.report_interval_secs
            )));
        }
        Ok(())
    }

    /// Time between frames at the target rate.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.target_fps.max(1)))
    }

    /// Time between health reports.
    #[must_use]
    pub const fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}
