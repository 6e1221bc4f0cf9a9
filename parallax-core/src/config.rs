//! Static display configuration.
//!
//! Read once at startup and never reloaded.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Physical display and projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Screen diagonal in inches.
    pub screen_diagonal_in: f32,
    /// Horizontal resolution in pixels.
    pub resolution_width_px: u32,
    /// Vertical resolution in pixels.
    pub resolution_height_px: u32,
    /// Distance the screen plane sits behind the origin, in centimetres.
    pub screen_z_offset_cm: f32,
    /// Near clip plane distance.
    pub near_plane: f32,
    /// Far clip plane distance.
    pub far_plane: f32,
    /// Multiplier on eye offsets and screen extents.
    pub parallax_scale: f32,
    /// How far the virtual camera sits behind the viewer, in centimetres.
    pub virtual_camera_offset_z_cm: f32,
}

impl DisplayConfig {
    /// 65" 4K autostereoscopic panel.
    #[must_use]
    pub fn uhd_65() -> Self {
        Self {
            screen_diagonal_in: 65.0,
            resolution_width_px: 3840,
            resolution_height_px: 2160,
            screen_z_offset_cm: 0.0,
            near_plane: 0.1,
            far_plane: 10_000.0,
            parallax_scale: 2.0,
            virtual_camera_offset_z_cm: 200.0,
        }
    }

    /// Check every value is usable for projection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.screen_diagonal_in.is_finite() && self.screen_diagonal_in > 0.0) {
            return Err(invalid(format!(
                "screen diagonal must be positive, got {}",
                self.screen_diagonal_in
            )));
        }
        if self.resolution_width_px == 0 || self.resolution_height_px == 0 {
            return Err(invalid(format!(
                "resolution must be non-zero, got {}x{}",
                self.resolution_width_px, self.resolution_height_px
            )));
        }
        if !(self.near_plane.is_finite() && self.near_plane > 0.0) {
            return Err(invalid(format!(
                "near plane must be positive, got {}",
                self.near_plane
            )));
        }
        if !(self.far_plane.is_finite() && self.far_plane > self.near_plane) {
            return Err(invalid(format!(
                "far plane {} must be greater than near plane {}",
                self.far_plane, self.near_plane
            )));
        }
        if !(self.parallax_scale.is_finite() && self.parallax_scale > 0.0) {
            return Err(invalid(format!(
                "parallax scale must be positive, got {}",
                self.parallax_scale
            )));
        }
        if !self.screen_z_offset_cm.is_finite() || !self.virtual_camera_offset_z_cm.is_finite() {
            return Err(invalid("offsets must be finite".to_string()));
        }
        Ok(())
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::uhd_65()
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

/// Load any serde type from a JSON file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Serialization`] if it does not match `T`.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> ConfigResult<T> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&text)?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(DisplayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_equal_clip_planes_rejected() {
        let config = DisplayConfig {
            near_plane: 5.0,
            far_plane: 5.0,
            ..DisplayConfig::default()
        };
        let err = config.validate().expect_err("near == far");
        assert!(err.to_string().contains("far plane"));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let config = DisplayConfig {
            resolution_height_px: 0,
            ..DisplayConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_parallax_scale_rejected() {
        for scale in [0.0, -1.0, f32::NAN] {
            let config = DisplayConfig {
                parallax_scale: scale,
                ..DisplayConfig::default()
            };
            assert!(config.validate().is_err(), "scale {scale} accepted");
        }
    }

    #[test]
    fn test_load_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "parallax_scale": 1.5, "near_plane": 1.0 }}"#).expect("write");

        let config: DisplayConfig = load_json(file.path()).expect("load");

        assert!((config.parallax_scale - 1.5).abs() < f32::EPSILON);
        assert!((config.near_plane - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.resolution_width_px, 3840);
    }

    #[test]
    fn test_load_missing_file() {
        let result: ConfigResult<DisplayConfig> = load_json("/nonexistent/parallax.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{ not json").expect("write");

        let result: ConfigResult<DisplayConfig> = load_json(file.path());
        assert!(matches!(result, Err(ConfigError::Serialization(_))));
    }
}
