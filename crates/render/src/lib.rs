//! Rendering Adapter: renderer-agnostic interface plus the per-frame plumbing.
//!
//! # Invariants
//! - Renderers read the scene; they never change its rotations.
//! - Camera aspect equals viewport width / height after every resize.
//! - The frame loop runs until its [`CancelHandle`] fires.

mod camera;
mod frame;
mod renderer;
mod viewport;

pub use camera::PerspectiveCamera;
pub use frame::{CancelHandle, FrameClock, FrameLoop, SteppedClock, SystemClock};
pub use renderer::{DebugTextRenderer, Renderer};
pub use viewport::{MAX_PIXEL_RATIO, Viewport};

pub fn crate_info() -> &'static str {
    "nebula-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
