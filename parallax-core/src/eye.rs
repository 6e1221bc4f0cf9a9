//! Eye identifiers and positions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which eye a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    /// The viewer's left eye.
    Left,
    /// The viewer's right eye.
    Right,
}

impl Eye {
    /// Both eyes, in render order.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// Lowercase name, used for log fields and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked eye position in centimetres, relative to the screen centre.
///
/// +X is to the viewer's right, +Y up, +Z out of the screen towards the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyePosition {
    /// Horizontal offset.
    pub x: f32,
    /// Vertical offset.
    pub y: f32,
    /// Distance from the screen plane.
    pub z: f32,
}

impl EyePosition {
    /// Startup estimate for the left eye before any packet arrives.
    pub const DEFAULT_LEFT: Self = Self::new(3.0, 0.0, 160.0);

    /// Startup estimate for the right eye before any packet arrives.
    pub const DEFAULT_RIGHT: Self = Self::new(-3.0, 0.0, 160.0);

    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Startup estimate for the given eye.
    #[must_use]
    pub const fn default_for(eye: Eye) -> Self {
        match eye {
            Eye::Left => Self::DEFAULT_LEFT,
            Eye::Right => Self::DEFAULT_RIGHT,
        }
    }

    /// Whether all three components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Components as an `[x, y, z]` array.
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for EyePosition {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for EyePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}
