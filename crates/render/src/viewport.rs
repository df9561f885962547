use nebula_common::ViewportSize;

use crate::camera::PerspectiveCamera;

/// Upper bound on the device pixel ratio used for the framebuffer.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Tracks the drawing area and keeps the camera aspect in step with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    size: ViewportSize,
    pixel_ratio: f32,
}

impl Viewport {
    pub fn new(size: ViewportSize, device_pixel_ratio: f32, camera: &mut PerspectiveCamera) -> Self {
        let mut viewport = Self {
            size,
            pixel_ratio: 1.0,
        };
        viewport.resize(size, device_pixel_ratio, camera);
        viewport
    }

    /// Apply a resize notification.
    ///
    /// Updates the camera aspect, clamps the pixel ratio to
    /// [`MAX_PIXEL_RATIO`], and returns the new framebuffer size.
    pub fn resize(
        &mut self,
        size: ViewportSize,
        device_pixel_ratio: f32,
        camera: &mut PerspectiveCamera,
    ) -> (u32, u32) {
        self.size = size;
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);
        camera.aspect = size.aspect();
        tracing::debug!(
            width = size.width,
            height = size.height,
            pixel_ratio = self.pixel_ratio,
            "viewport resized"
        );
        self.framebuffer_size()
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Output size in logical pixels.
    pub fn output_size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }

    /// Backing buffer size in physical pixels, never zero.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.size.width), scale(self.size.height))
    }
}

fn clamp_pixel_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}
