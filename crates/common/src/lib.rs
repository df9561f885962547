//! Shared value types and configuration for the nebula workspace.

pub mod config;
pub mod types;

pub use config::{
    CameraConfig, ConfigError, LightConfig, MAX_TORUS_SEGMENTS, MotionConfig, SceneConfig,
    StarsConfig, TorusConfig,
};
pub use types::{Color, Rotation, ViewportSize};
