use crate::action::Action;

/// Latest pointer position in client coordinates.
///
/// Starts at the origin, so the star cloud keeps its baseline drift until
/// the pointer has been seen at a positive X.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Holds the most recent pointer position. Last write wins; no history.
#[derive(Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored position with the event coordinates.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.state = PointerState { x, y };
        tracing::trace!(x, y, "pointer moved");
    }

    /// Feed an action; only pointer movement is consumed.
    pub fn apply(&mut self, action: &Action) {
        if let Action::PointerMoved(p) = action {
            self.on_pointer_move(p.x, p.y);
        }
    }

    pub fn pointer(&self) -> PointerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn starts_at_origin() {
        let tracker = PointerTracker::new();
        assert_eq!(tracker.pointer(), PointerState::new(0.0, 0.0));
    }

    #[test]
    fn move_overwrites_previous_value() {
        let mut tracker = PointerTracker::new();
        tracker.on_pointer_move(640.0, 12.0);
        tracker.on_pointer_move(100.0, 50.0);
        assert_eq!(tracker.pointer(), PointerState::new(100.0, 50.0));
    }

    #[test]
    fn accepts_out_of_bounds_coordinates() {
        let mut tracker = PointerTracker::new();
        tracker.on_pointer_move(-30.0, 1e6);
        assert_eq!(tracker.pointer(), PointerState::new(-30.0, 1e6));
    }

    #[test]
    fn apply_ignores_non_pointer_actions() {
        let mut tracker = PointerTracker::new();
        tracker.apply(&Action::PointerMoved(Vec2::new(3.0, 4.0)));
        tracker.apply(&Action::ToggleOverlay);
        tracker.apply(&Action::Resize {
            width: 10,
            height: 10,
            scale_factor: 2.0,
        });
        assert_eq!(tracker.pointer(), PointerState::new(3.0, 4.0));
    }
}
