use nebula_scene::{PointCloud, Scene};
use std::fmt::Write;

use crate::camera::PerspectiveCamera;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and camera and produces output. It never
/// changes rotations; those belong to the frame updater.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the scene as seen by the camera.
    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Text renderer for headless runs, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn describe_cloud(out: &mut String, cloud: &PointCloud) {
    let r = cloud.rotation;
    let m = &cloud.material;
    let _ = writeln!(
        out,
        "  {:<6} points={:<5} rot=({:.4}, {:.4}, {:.4}) size={} textured={}",
        cloud.name,
        cloud.len(),
        r.x,
        r.y,
        r.z,
        m.size,
        m.texture.is_some()
    );
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (frame={}, t={:.3}s) ===",
            scene.frame_count(),
            scene.elapsed()
        );
        for cloud in scene.clouds() {
            describe_cloud(&mut out, cloud);
        }
        let l = &scene.light;
        let _ = writeln!(
            out,
            "Light: pos=({:.1}, {:.1}, {:.1}) intensity={}",
            l.position.x, l.position.y, l.position.z, l.intensity
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.fov.to_degrees(),
            camera.aspect
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_input::PointerState;

    #[test]
    fn fresh_scene() {
        let scene = Scene::with_seed(5).unwrap();
        let output = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("frame=0"));
        assert!(output.contains("torus  points=1717"));
        assert!(output.contains("stars  points=5000"));
        assert!(output.contains("textured=true"));
        assert!(output.contains("fov=75"));
    }

    #[test]
    fn shows_rotations_after_animate() {
        let mut scene = Scene::with_seed(5).unwrap();
        scene.animate(10.0, PointerState::new(200.0, 100.0));
        let output = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("t=10.000s"));
        assert!(output.contains("rot=(0.0000, 5.0000, 0.0000)"));
        assert!(output.contains("rot=(-0.0800, -0.1600, 0.0000)"));
    }

    #[test]
    fn renderer_does_not_touch_rotations() {
        let mut scene = Scene::with_seed(5).unwrap();
        scene.animate(2.0, PointerState::default());
        let before = (scene.torus.rotation, scene.stars.rotation);
        let _ = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert_eq!((scene.torus.rotation, scene.stars.rotation), before);
    }
}
