use nebula_common::MotionConfig;
use nebula_input::PointerState;

/// Rotation values produced for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRotations {
    /// Torus rotation about Y.
    pub torus_y: f32,
    /// Star cloud rotation about Y.
    pub stars_y: f32,
    /// Star cloud rotation about X, only written once the pointer is at x > 0.
    /// `None` leaves the previous value in place.
    pub stars_x: Option<f32>,
}

/// Map elapsed seconds and the latest pointer position to rotations.
///
/// The pointer term multiplies raw client coordinates by elapsed time, so
/// the tilt keeps growing for as long as the session runs.
pub fn frame_rotations(elapsed: f32, pointer: PointerState, motion: &MotionConfig) -> FrameRotations {
    let torus_y = motion.torus_spin * elapsed;

    if pointer.x > 0.0 {
        FrameRotations {
            torus_y,
            stars_y: -pointer.x * elapsed * motion.pointer_gain,
            stars_x: Some(-pointer.y * elapsed * motion.pointer_gain),
        }
    } else {
        FrameRotations {
            torus_y,
            stars_y: motion.stars_drift * elapsed,
            stars_x: None,
        }
    }
}
