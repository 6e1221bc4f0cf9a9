//! Generalized off-axis perspective projection.
//!
//! Given three corners of a physical screen and an eye position in the same
//! frame, computes the asymmetric frustum through which the eye sees the
//! screen:
//!
//! ```text
//!            pc
//!            │╲
//!            │  ╲            vu
//!            │    ╲          ▲
//!            │      ● pe     │
//!            │    ╱          └──▶ vr
//!            │  ╱           ╱
//!            │╱            vn (towards viewer)
//!            pa ─────── pb
//! ```
//!
//! 1. Screen basis: `vr = |pb − pa|`, `vu = |pc − pa|`, `vn = |vr × vu|`.
//! 2. Eye-to-corner vectors `va`, `vb`, `vc`.
//! 3. Perpendicular distance `d = −(va · vn)`, which must be positive.
//! 4. Near-plane extents by similar triangles.

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, ProjectionResult};
use crate::screen::ScreenCorners;
use crate::spatial::{Mat4, Vec3};

/// One eye's asymmetric view frustum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoFrustum {
    /// Left extent on the near plane.
    pub left: f32,
    /// Right extent on the near plane.
    pub right: f32,
    /// Bottom extent on the near plane.
    pub bottom: f32,
    /// Top extent on the near plane.
    pub top: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
}

impl StereoFrustum {
    /// Perspective projection matrix for this frustum, column-major.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::off_center(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }

    /// Horizontal centre offset on the near plane. Zero when on-axis.
    #[must_use]
    pub fn horizontal_skew(&self) -> f32 {
        (self.right + self.left) / 2.0
    }

    /// Vertical centre offset on the near plane. Zero when on-axis.
    #[must_use]
    pub fn vertical_skew(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Check clip planes before any frustum is built.
///
/// # Errors
///
/// Returns [`ProjectionError::InvalidClipPlanes`] unless `0 < near < far`
/// with both finite.
pub fn validate_clip_planes(near: f32, far: f32) -> ProjectionResult<()> {
    if near.is_finite() && far.is_finite() && near > 0.0 && far > near {
        Ok(())
    } else {
        Err(ProjectionError::InvalidClipPlanes { near, far })
    }
}

/// Compute the off-axis frustum for eye `pe` looking through `screen`.
///
/// # Errors
///
/// - [`ProjectionError::InvalidClipPlanes`] for unusable near/far.
/// - [`ProjectionError::NonFinite`] if the eye has a non-finite component.
/// - [`ProjectionError::DegenerateScreen`] if the corners do not span a plane.
/// - [`ProjectionError::EyeBehindScreen`] if the eye is on or behind the plane.
/// - [`ProjectionError::DegenerateFrustum`] if the extents collapse.
pub fn off_axis_frustum(
    screen: &ScreenCorners,
    pe: Vec3,
    near: f32,
    far: f32,
) -> ProjectionResult<StereoFrustum> {
    validate_clip_planes(near, far)?;
    if !pe.is_finite() {
        return Err(ProjectionError::NonFinite("eye position"));
    }

    let ScreenCorners { pa, pb, pc } = *screen;

    let vr = (pb - pa).normalize();
    let vu = (pc - pa).normalize();
    let vn = vr.cross(vu).normalize();
    if vn.length() == 0.0 || !vn.is_finite() {
        return Err(ProjectionError::DegenerateScreen(
            "corners do not span a plane".to_string(),
        ));
    }

    let va = pa - pe;
    let vb = pb - pe;
    let vc = pc - pe;

    let d = -va.dot(vn);
    if d.is_nan() || d <= 0.0 {
        return Err(ProjectionError::EyeBehindScreen { distance: d });
    }

    let scale = near / d;
    let frustum = StereoFrustum {
        left: vr.dot(va) * scale,
        right: vr.dot(vb) * scale,
        bottom: vu.dot(va) * scale,
        top: vu.dot(vc) * scale,
        near,
        far,
    };

    if !(frustum.left < frustum.right && frustum.bottom < frustum.top) {
        return Err(ProjectionError::DegenerateFrustum {
            left: frustum.left,
            right: frustum.right,
            bottom: frustum.bottom,
            top: frustum.top,
        });
    }

    Ok(frustum)
}

/// Convenience wrapper returning the projection matrix directly.
///
/// # Errors
///
/// See [`off_axis_frustum`].
pub fn off_axis_projection(
    screen: &ScreenCorners,
    pe: Vec3,
    near: f32,
    far: f32,
) -> ProjectionResult<Mat4> {
    off_axis_frustum(screen, pe, near, far).map(|f| f.projection_matrix())
}
