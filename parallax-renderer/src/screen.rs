//! Physical screen geometry.
//!
//! ```text
//!   pc ─────────────────────┐
//!   │                       │   height_cm
//!   │         origin        │
//!   │           ●           │
//!   pa ──────────────────── pb
//!             width_cm
//! ```
//!
//! The screen is centred on the origin in the XY plane, `z_offset_cm`
//! behind it, with its normal pointing towards the viewer (+Z).

use parallax_core::{DisplayConfig, EyePosition};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, ProjectionResult};
use crate::spatial::Vec3;

const CM_PER_INCH: f64 = 2.54;

/// The three reference corners spanning the screen plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenCorners {
    /// Bottom-left.
    pub pa: Vec3,
    /// Bottom-right.
    pub pb: Vec3,
    /// Top-left.
    pub pc: Vec3,
}

/// Screen size and placement, computed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// Size of one pixel in centimetres.
    pub pixel_pitch_cm: f32,
    /// Physical width in centimetres.
    pub width_cm: f32,
    /// Physical height in centimetres.
    pub height_cm: f32,
    /// Distance of the screen plane behind the origin, in centimetres.
    pub z_offset_cm: f32,
}

impl ScreenGeometry {
    /// Derive physical size from diagonal and resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::DegenerateScreen`] if the diagonal or
    /// either resolution is not positive.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_diagonal(
        diagonal_in: f32,
        width_px: u32,
        height_px: u32,
        z_offset_cm: f32,
    ) -> ProjectionResult<Self> {
        if !(diagonal_in.is_finite() && diagonal_in > 0.0) || width_px == 0 || height_px == 0 {
            return Err(ProjectionError::DegenerateScreen(format!(
                "{diagonal_in}\" at {width_px}x{height_px}"
            )));
        }
        if !z_offset_cm.is_finite() {
            return Err(ProjectionError::NonFinite("screen z offset"));
        }

        let (w, h) = (f64::from(width_px), f64::from(height_px));
        let pitch = f64::from(diagonal_in) * CM_PER_INCH / (w * w + h * h).sqrt();

        Ok(Self {
            pixel_pitch_cm: pitch as f32,
            width_cm: (w * pitch) as f32,
            height_cm: (h * pitch) as f32,
            z_offset_cm,
        })
    }

    /// Geometry described by a display configuration.
    ///
    /// # Errors
    ///
    /// See [`ScreenGeometry::from_diagonal`].
    pub fn from_config(config: &DisplayConfig) -> ProjectionResult<Self> {
        Self::from_diagonal(
            config.screen_diagonal_in,
            config.resolution_width_px,
            config.resolution_height_px,
            config.screen_z_offset_cm,
        )
    }

    /// Width over height.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width_cm / self.height_cm
    }

    /// Corners with half-extents multiplied by `scale`.
    #[must_use]
    pub fn corners(&self, scale: f32) -> ScreenCorners {
        let half_w = self.width_cm * scale / 2.0;
        let half_h = self.height_cm * scale / 2.0;
        let z = -self.z_offset_cm;

        ScreenCorners {
            pa: Vec3::new(-half_w, -half_h, z),
            pb: Vec3::new(half_w, -half_h, z),
            pc: Vec3::new(-half_w, half_h, z),
        }
    }

    /// Normalized device coordinates of a point projected straight onto the
    /// screen, for drawing a marker where the viewer is.
    #[must_use]
    pub fn eye_screen_location(&self, eye: EyePosition) -> [f32; 2] {
        [eye.x / self.width_cm * 2.0, eye.y / self.height_cm * 2.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_65_inch_uhd_dimensions() {
        let screen = ScreenGeometry::from_diagonal(65.0, 3840, 2160, 0.0).expect("valid");

        // 65" 16:9 panel is about 143.9 x 80.9 cm.
        assert!(approx_eq(screen.width_cm, 143.9, 0.1), "{}", screen.width_cm);
        assert!(approx_eq(screen.height_cm, 80.9, 0.1), "{}", screen.height_cm);
        assert!(approx_eq(screen.aspect(), 16.0 / 9.0, 1e-4));

        let diagonal_cm = screen.width_cm.hypot(screen.height_cm);
        assert!(approx_eq(diagonal_cm, 65.0 * 2.54, 1e-3));
    }

    #[test]
    fn test_degenerate_screens_rejected() {
        assert!(ScreenGeometry::from_diagonal(0.0, 3840, 2160, 0.0).is_err());
        assert!(ScreenGeometry::from_diagonal(65.0, 0, 2160, 0.0).is_err());
        assert!(ScreenGeometry::from_diagonal(65.0, 3840, 0, 0.0).is_err());
        assert!(ScreenGeometry::from_diagonal(-1.0, 3840, 2160, 0.0).is_err());
        assert!(matches!(
            ScreenGeometry::from_diagonal(65.0, 3840, 2160, f32::NAN),
            Err(ProjectionError::NonFinite(_))
        ));
    }

    #[test]
    fn test_corners_are_centred_and_scaled() {
        let screen = ScreenGeometry {
            pixel_pitch_cm: 0.1,
            width_cm: 100.0,
            height_cm: 50.0,
            z_offset_cm: 10.0,
        };

        let corners = screen.corners(2.0);
        assert_eq!(corners.pa, Vec3::new(-100.0, -50.0, -10.0));
        assert_eq!(corners.pb, Vec3::new(100.0, -50.0, -10.0));
        assert_eq!(corners.pc, Vec3::new(-100.0, 50.0, -10.0));
    }

    #[test]
    fn test_eye_screen_location() {
        let screen = ScreenGeometry {
            pixel_pitch_cm: 0.1,
            width_cm: 100.0,
            height_cm: 50.0,
            z_offset_cm: 0.0,
        };

        let [x, y] = screen.eye_screen_location(EyePosition::new(25.0, -12.5, 160.0));
        assert!(approx_eq(x, 0.5, 1e-6));
        assert!(approx_eq(y, -0.5, 1e-6));
    }
}
