//! Projection error types.

use thiserror::Error;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors that can occur while deriving a stereo projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// Near plane not positive, or far plane not beyond it.
    #[error("Invalid clip planes: near {near}, far {far}")]
    InvalidClipPlanes {
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },

    /// Screen has zero or non-finite width or height.
    #[error("Degenerate screen: {0}")]
    DegenerateScreen(String),

    /// Parallax scale is not a positive finite number.
    #[error("Invalid parallax scale: {0}")]
    InvalidParallaxScale(f32),

    /// Eye is on or behind the screen plane.
    #[error("Eye is not in front of the screen (distance {distance})")]
    EyeBehindScreen {
        /// Signed perpendicular distance from eye to screen plane.
        distance: f32,
    },

    /// Frustum extents collapsed to zero width or height.
    #[error("Degenerate frustum: left {left}, right {right}, bottom {bottom}, top {top}")]
    DegenerateFrustum {
        /// Left extent.
        left: f32,
        /// Right extent.
        right: f32,
        /// Bottom extent.
        bottom: f32,
        /// Top extent.
        top: f32,
    },

    /// An input or result component is infinite or NaN.
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}
