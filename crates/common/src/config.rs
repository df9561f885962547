//! Scene configuration loaded from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Color;

/// Upper bound on either torus segment count.
pub const MAX_TORUS_SEGMENTS: u32 = 1024;

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid colour {0:?}: expected #rrggbb")]
    InvalidColor(String),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorusConfig {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
    pub point_size: f32,
    pub color: String,
}

impl Default for TorusConfig {
    fn default() -> Self {
        Self {
            radius: 0.7,
            tube: 0.2,
            radial_segments: 16,
            tubular_segments: 100,
            point_size: 0.005,
            color: "#ffffff".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarsConfig {
    pub point_size: f32,
    pub color: String,
    /// Sprite image drawn for each star. `None` uses the built-in sprite.
    pub texture: Option<PathBuf>,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            point_size: 0.001,
            color: "#e6f0fc".into(),
            texture: Some(PathBuf::from("assets/star.png")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: String,
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [2.0, 3.0, 4.0],
            color: "#ffffff".into(),
            intensity: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 0.0, 2.0],
        }
    }
}

/// Coefficients of the per-frame rotation mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Torus rotation about Y, radians per second.
    pub torus_spin: f32,
    /// Baseline star rotation about Y, radians per second.
    pub stars_drift: f32,
    /// Scale applied to `pointer * elapsed` once the pointer has moved.
    pub pointer_gain: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            torus_spin: 0.5,
            stars_drift: -0.1,
            pointer_gain: 0.00008,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub torus: TorusConfig,
    pub stars: StarsConfig,
    pub light: LightConfig,
    pub camera: CameraConfig,
    pub motion: MotionConfig,
    pub background: String,
    /// Seed for star placement. `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            torus: TorusConfig::default(),
            stars: StarsConfig::default(),
            light: LightConfig::default(),
            camera: CameraConfig::default(),
            motion: MotionConfig::default(),
            background: "#21282a".into(),
            seed: None,
        }
    }
}

impl SceneConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for color in [
            &self.torus.color,
            &self.stars.color,
            &self.light.color,
            &self.background,
        ] {
            Color::from_hex(color)?;
        }

        positive("torus.radius", self.torus.radius)?;
        positive("torus.tube", self.torus.tube)?;
        positive("torus.point_size", self.torus.point_size)?;
        positive("stars.point_size", self.stars.point_size)?;
        segments("torus.radial_segments", self.torus.radial_segments, 2)?;
        segments("torus.tubular_segments", self.torus.tubular_segments, 3)?;

        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid {
                field: "camera.fov_degrees",
                reason: format!("{} is outside (0, 180)", cam.fov_degrees),
            });
        }
        positive("camera.near", cam.near)?;
        if cam.near >= cam.far {
            return Err(ConfigError::Invalid {
                field: "camera.far",
                reason: format!("far ({}) must exceed near ({})", cam.far, cam.near),
            });
        }
        Ok(())
    }

    pub fn background_color(&self) -> Result<Color, ConfigError> {
        Color::from_hex(&self.background)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be a positive number"),
        })
    }
}

fn segments(field: &'static str, value: u32, min: u32) -> Result<(), ConfigError> {
    if (min..=MAX_TORUS_SEGMENTS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside {min}..={MAX_TORUS_SEGMENTS}"),
        })
    }
}
