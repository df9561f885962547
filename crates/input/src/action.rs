use glam::Vec2;

/// A high-level action produced from host window events.
///
/// The scene and the frame loop consume actions, never raw window events,
/// so a different host only has to provide a new mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Pointer moved to the given client coordinates (logical pixels).
    PointerMoved(Vec2),
    /// Drawing area changed size (logical pixels) or pixel density.
    Resize {
        width: u32,
        height: u32,
        scale_factor: f32,
    },
    /// Show or hide the debug overlay.
    ToggleOverlay,
    /// Stop the frame loop.
    Quit,
    /// No-op (used for input that has no binding).
    Noop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_moved_carries_coordinates() {
        let a = Action::PointerMoved(Vec2::new(100.0, 50.0));
        assert!(matches!(a, Action::PointerMoved(p) if p == Vec2::new(100.0, 50.0)));
    }

    #[test]
    fn resize_is_constructible() {
        let a = Action::Resize {
            width: 800,
            height: 600,
            scale_factor: 1.0,
        };
        assert!(matches!(a, Action::Resize { width: 800, .. }));
    }
}
