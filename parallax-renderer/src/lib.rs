//! # Parallax Renderer
//!
//! Off-axis stereo projection for head-tracked displays. Produces the view
//! and projection matrices a render backend needs for each eye; drawing
//! itself is left to the backend.
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐   ┌──────────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ EyeState  │──▶│ × parallax scale │──▶│ off-axis       │──▶│ projection + │
//! │ snapshot  │   │                  │   │ frustum        │   │ view (Mat4)  │
//! └───────────┘   └──────────────────┘   └────────────────┘   └──────────────┘
//!                                                ▲
//!                                        ScreenGeometry corners
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod error;
pub mod projection;
pub mod screen;
pub mod spatial;
pub mod stereo;

pub use camera::{Camera, Movement};
pub use error::{ProjectionError, ProjectionResult};
pub use projection::{off_axis_frustum, off_axis_projection, StereoFrustum};
pub use screen::{ScreenCorners, ScreenGeometry};
pub use spatial::{Mat4, Vec3};
pub use stereo::{EyeOutput, StereoFrame, StereoProjectionEngine, StereoStats};
