//! # Stereo Projection Engine
//!
//! Turns the latest published eye positions into per-eye view and
//! projection matrices for a head-tracked stereo display.
//!
//! ## Usage
//!
//! ```text
//! 1. Build a StereoProjectionEngine from a DisplayConfig and the EyeState
//!    the tracker publishes into
//! 2. Each frame, call frame() (or projection()/view() per eye)
//! 3. Upload the matrices to the render backend
//! ```
//!
//! Both eyes of a [`StereoFrame`] come from the same eye snapshot and the
//! same screen geometry. If an eye position cannot be projected (on or
//! behind the screen, non-finite), the last valid output for that eye is
//! reused and the fault is logged.

use metrics::counter;
use parallax_core::{DisplayConfig, Eye, EyePair, EyePosition, EyeState};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::{ProjectionError, ProjectionResult};
use crate::projection::{off_axis_frustum, validate_clip_planes, StereoFrustum};
use crate::screen::{ScreenCorners, ScreenGeometry};
use crate::spatial::{Mat4, Vec3};

/// Centimetres per world unit (1 unit = 1 m).
pub const CM_PER_UNIT: f32 = 100.0;

const PROJECTION_FALLBACKS_TOTAL: &str = "parallax_projection_fallbacks_total";

/// Everything the render backend needs for one eye.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeOutput {
    /// Which eye this is for.
    pub eye: Eye,
    /// Off-axis projection matrix.
    pub projection: Mat4,
    /// View matrix from the eye's world position.
    pub view: Mat4,
    /// The frustum the projection was built from.
    pub frustum: StereoFrustum,
    /// Eye offset from the camera position, in world units.
    pub eye_offset: Vec3,
    /// Eye position after parallax scaling, in centimetres.
    pub scaled_eye: Vec3,
}

/// Both eyes' outputs for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoFrame {
    /// Left eye output.
    pub left: EyeOutput,
    /// Right eye output.
    pub right: EyeOutput,
    /// Sequence of the eye snapshot used.
    pub sequence: u64,
    /// Whether either eye fell back to its last valid output.
    pub degraded: bool,
}

impl StereoFrame {
    /// Output for the given eye.
    #[must_use]
    pub const fn get(&self, eye: Eye) -> &EyeOutput {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

/// Projection statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StereoStats {
    /// Frames produced via [`StereoProjectionEngine::frame`].
    pub frames: u64,
    /// Per-eye outputs resolved, including fallbacks.
    pub eye_outputs: u64,
    /// Outputs that reused the last valid result.
    pub fallbacks: u64,
    /// Highest eye snapshot sequence seen.
    pub last_sequence: u64,
}

impl StereoStats {
    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-frame generalized perspective projection for both eyes.
#[derive(Debug)]
pub struct StereoProjectionEngine {
    config: DisplayConfig,
    screen: ScreenGeometry,
    /// Corners with parallax scaling applied; fixed for the engine's lifetime.
    corners: ScreenCorners,
    camera: Camera,
    eyes: EyeState,
    last_good: [EyeOutput; 2],
    stats: StereoStats,
}

impl StereoProjectionEngine {
    /// Create an engine reading from `eyes` with the default camera.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionError`] if the clip planes, parallax scale or
    /// screen are unusable, or if the startup eye positions cannot be
    /// projected.
    pub fn new(config: DisplayConfig, eyes: EyeState) -> ProjectionResult<Self> {
        Self::with_camera(config, Camera::default(), eyes)
    }

    /// Create an engine with an explicit baseline camera.
    ///
    /// # Errors
    ///
    /// See [`StereoProjectionEngine::new`].
    pub fn with_camera(
        config: DisplayConfig,
        camera: Camera,
        eyes: EyeState,
    ) -> ProjectionResult<Self> {
        validate_clip_planes(config.near_plane, config.far_plane)?;
        if !(config.parallax_scale.is_finite() && config.parallax_scale > 0.0) {
            return Err(ProjectionError::InvalidParallaxScale(config.parallax_scale));
        }
        if !config.virtual_camera_offset_z_cm.is_finite() {
            return Err(ProjectionError::NonFinite("virtual camera offset"));
        }

        let screen = ScreenGeometry::from_config(&config)?;
        let corners = screen.corners(config.parallax_scale);

        let mut engine = Self {
            config,
            screen,
            corners,
            camera,
            eyes,
            last_good: [Self::placeholder(Eye::Left), Self::placeholder(Eye::Right)],
            stats: StereoStats::default(),
        };

        for eye in Eye::BOTH {
            let output = engine.derive(eye, EyePosition::default_for(eye))?;
            engine.last_good[Self::index(eye)] = output;
        }

        tracing::info!(
            width_cm = engine.screen.width_cm,
            height_cm = engine.screen.height_cm,
            parallax_scale = engine.config.parallax_scale,
            "Stereo projection engine ready"
        );

        Ok(engine)
    }

    /// Display configuration in use.
    #[must_use]
    pub const fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Physical screen geometry.
    #[must_use]
    pub const fn screen(&self) -> &ScreenGeometry {
        &self.screen
    }

    /// Scaled screen corners used for every projection.
    #[must_use]
    pub const fn corners(&self) -> &ScreenCorners {
        &self.corners
    }

    /// Baseline camera.
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable baseline camera, for host input handling.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The shared eye state this engine reads.
    #[must_use]
    pub const fn eye_state(&self) -> &EyeState {
        &self.eyes
    }

    /// Projection statistics.
    #[must_use]
    pub const fn stats(&self) -> &StereoStats {
        &self.stats
    }

    /// Reset projection statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Derive one eye's output from an explicit position.
    ///
    /// Pure: identical inputs give bit-identical results and no engine
    /// state changes.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionError`] if the scaled eye is not strictly in
    /// front of the screen or any value is non-finite.
    pub fn derive(&self, eye: Eye, position: EyePosition) -> ProjectionResult<EyeOutput> {
        let scaled_eye = Vec3::from(position) * self.config.parallax_scale;

        let frustum = off_axis_frustum(
            &self.corners,
            scaled_eye,
            self.config.near_plane,
            self.config.far_plane,
        )?;

        let eye_offset = scaled_eye * (1.0 / CM_PER_UNIT)
            + Vec3::new(0.0, 0.0, -self.config.virtual_camera_offset_z_cm / CM_PER_UNIT);

        let projection = frustum.projection_matrix();
        let view = self.camera.view_matrix_with_offset(eye_offset);
        if !projection.is_finite() || !view.is_finite() {
            return Err(ProjectionError::NonFinite("derived matrices"));
        }

        Ok(EyeOutput {
            eye,
            projection,
            view,
            frustum,
            eye_offset,
            scaled_eye,
        })
    }

    /// Output for one eye from the latest published positions.
    pub fn eye_output(&mut self, eye: Eye) -> EyeOutput {
        let pair = self.eyes.snapshot();
        self.observe(&pair);
        self.resolve(eye, pair.get(eye)).0
    }

    /// Projection matrix for one eye.
    pub fn projection(&mut self, eye: Eye) -> Mat4 {
        self.eye_output(eye).projection
    }

    /// View matrix for one eye.
    pub fn view(&mut self, eye: Eye) -> Mat4 {
        self.eye_output(eye).view
    }

    /// Eye offset from the camera position, in world units.
    pub fn eye_world_offset(&mut self, eye: Eye) -> Vec3 {
        self.eye_output(eye).eye_offset
    }

    /// Both eyes from a single snapshot of the shared state.
    pub fn frame(&mut self) -> StereoFrame {
        let pair = self.eyes.snapshot();
        self.observe(&pair);

        let (left, left_fallback) = self.resolve(Eye::Left, pair.left);
        let (right, right_fallback) = self.resolve(Eye::Right, pair.right);

        self.stats.frames += 1;
        tracing::trace!(sequence = pair.sequence, "Stereo frame computed");

        StereoFrame {
            left,
            right,
            sequence: pair.sequence,
            degraded: left_fallback || right_fallback,
        }
    }

    /// Where the midpoint between the eyes falls on screen, in NDC.
    #[must_use]
    pub fn eye_marker(&self) -> [f32; 2] {
        self.screen.eye_screen_location(self.eyes.snapshot().midpoint())
    }

    fn observe(&mut self, pair: &EyePair) {
        self.stats.last_sequence = self.stats.last_sequence.max(pair.sequence);
    }

    fn resolve(&mut self, eye: Eye, position: EyePosition) -> (EyeOutput, bool) {
        self.stats.eye_outputs += 1;
        let slot = Self::index(eye);

        match self.derive(eye, position) {
            Ok(output) => {
                self.last_good[slot] = output;
                (output, false)
            }
            Err(e) => {
                self.stats.fallbacks += 1;
                counter!(PROJECTION_FALLBACKS_TOTAL, "eye" => eye.as_str()).increment(1);
                tracing::warn!(
                    %eye,
                    %position,
                    error = %e,
                    "Cannot project eye position, reusing last valid output"
                );
                (self.last_good[slot], true)
            }
        }
    }

    const fn index(eye: Eye) -> usize {
        match eye {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }

    fn placeholder(eye: Eye) -> EyeOutput {
        EyeOutput {
            eye,
            projection: Mat4::identity(),
            view: Mat4::identity(),
            frustum: StereoFrustum {
                left: -1.0,
                right: 1.0,
                bottom: -1.0,
                top: 1.0,
                near: 1.0,
                far: 2.0,
            },
            eye_offset: Vec3::ZERO,
            scaled_eye: Vec3::ZERO,
        }
    }
}
