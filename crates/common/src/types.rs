use glam::{EulerRot, Quat};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Euler rotation in radians, applied in XYZ order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.x, self.y, self.z)
    }
}

/// Logical size of the drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. A zero height counts as one.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// An sRGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ConfigError::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
        };
        Ok(Self::rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Convert to linear RGB for blending on sRGB render targets.
    pub fn to_linear(self) -> [f32; 3] {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_default_is_identity() {
        let r = Rotation::default();
        assert_eq!(r.to_quat(), Quat::IDENTITY);
    }

    #[test]
    fn rotation_about_y_matches_quat() {
        let r = Rotation::new(0.0, 1.25, 0.0);
        let expected = Quat::from_rotation_y(1.25);
        assert!(r.to_quat().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn viewport_aspect() {
        assert_eq!(ViewportSize::new(800, 600).aspect(), 800.0 / 600.0);
        assert_eq!(ViewportSize::new(640, 0).aspect(), 640.0);
    }

    #[test]
    fn parse_hex_colors() {
        let c = Color::from_hex("#21282a").unwrap();
        assert_eq!(c, Color::rgb8(0x21, 0x28, 0x2a));
        assert_eq!(Color::from_hex("ffffff").unwrap(), Color::WHITE);
    }

    #[test]
    fn reject_bad_hex() {
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("#ééé").is_err());
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Color::rgb8(0, 0, 0).to_linear(), [0.0, 0.0, 0.0]);
        let white = Color::WHITE.to_linear();
        for c in white {
            assert!((c - 1.0).abs() < 1e-6);
        }
    }
}
