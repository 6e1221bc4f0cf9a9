//! Yaw/pitch camera.
//!
//! Supplies the baseline orientation for the per-eye view matrices. The
//! stereo effect itself comes from the eye offset and the off-axis
//! projection, not from this camera.

use serde::{Deserialize, Serialize};

use crate::spatial::{Mat4, Vec3};

/// Default yaw in degrees, looking down -Z.
pub const DEFAULT_YAW: f32 = -90.0;
/// Default pitch in degrees.
pub const DEFAULT_PITCH: f32 = 0.0;
/// Default movement speed in units per second.
pub const DEFAULT_SPEED: f32 = 2.5;
/// Default mouse sensitivity in degrees per pixel.
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
/// Default (and maximum) zoom in degrees of vertical field of view.
pub const DEFAULT_ZOOM: f32 = 45.0;

const MAX_PITCH: f32 = 89.0;
const MIN_ZOOM: f32 = 1.0;

/// Keyboard movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    /// Along the front vector.
    Forward,
    /// Against the front vector.
    Backward,
    /// Against the right vector.
    Left,
    /// Along the right vector.
    Right,
}

/// Euler-angle camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Position in world space (metres).
    pub position: Vec3,
    /// Unit view direction.
    pub front: Vec3,
    /// Unit up vector, orthogonal to `front`.
    pub up: Vec3,
    /// Unit right vector.
    pub right: Vec3,
    /// World up used to derive `right` and `up`.
    pub world_up: Vec3,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Movement speed in units per second.
    pub movement_speed: f32,
    /// Degrees of rotation per pixel of mouse movement.
    pub mouse_sensitivity: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
}

impl Camera {
    /// Create a camera at `position` with the default orientation.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self::with_orientation(position, Vec3::UP, DEFAULT_YAW, DEFAULT_PITCH)
    }

    /// Create a camera with an explicit world up, yaw and pitch.
    #[must_use]
    pub fn with_orientation(position: Vec3, world_up: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::FORWARD,
            up: world_up,
            right: Vec3::new(1.0, 0.0, 0.0),
            world_up,
            yaw,
            pitch,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_ZOOM,
        };
        camera.update_vectors();
        camera
    }

    /// View matrix from the camera position.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix_with_offset(Vec3::ZERO)
    }

    /// View matrix looking from `position + offset` along `front`.
    #[must_use]
    pub fn view_matrix_with_offset(&self, offset: Vec3) -> Mat4 {
        let eye = self.position + offset;
        Mat4::look_at(eye, eye + self.front, self.up)
    }

    /// Symmetric projection using the zoom as vertical field of view.
    #[must_use]
    pub fn symmetric_projection(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective(self.zoom.to_radians(), aspect, near, far)
    }

    /// Move the camera for `delta_seconds` in `direction`.
    pub fn process_keyboard(&mut self, direction: Movement, delta_seconds: f32) {
        let velocity = self.movement_speed * delta_seconds;
        match direction {
            Movement::Forward => self.position += self.front * velocity,
            Movement::Backward => self.position -= self.front * velocity,
            Movement::Left => self.position -= self.right * velocity,
            Movement::Right => self.position += self.right * velocity,
        }
    }

    /// Rotate by a mouse delta in pixels.
    ///
    /// With `constrain_pitch`, pitch stays within ±89° so the view never flips.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        }

        self.update_vectors();
    }

    /// Zoom by a scroll delta; zoom stays within 1°..=45°.
    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, DEFAULT_ZOOM);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 1.0))
    }
}
