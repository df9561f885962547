use glam::{Mat4, Vec3};
use nebula_common::{Color, ConfigError, MotionConfig, Rotation, SceneConfig};
use nebula_input::PointerState;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

use crate::animate::frame_rotations;
use crate::geometry::{PARTICLE_COUNT, particle_cloud, torus_points};

/// How a point cloud is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMaterial {
    /// Point diameter in world units at unit distance.
    pub size: f32,
    pub color: Color,
    /// Sprite image for each point. `None` draws plain squares.
    pub texture: Option<PathBuf>,
    /// Drawn after opaque clouds, blended, without depth writes.
    pub transparent: bool,
}

/// A set of unconnected points sharing one material and one rotation.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub name: &'static str,
    pub positions: Vec<Vec3>,
    pub material: PointMaterial,
    pub rotation: Rotation,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation.to_quat())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
}

/// The whole scene: torus, stars, light, background.
///
/// Built once; afterwards only the cloud rotations change, and only through
/// [`Scene::animate`].
#[derive(Debug, Clone)]
pub struct Scene {
    pub torus: PointCloud,
    pub stars: PointCloud,
    pub light: PointLight,
    pub background: Color,
    motion: MotionConfig,
    elapsed: f32,
    frames: u64,
}

impl Scene {
    /// Build the scene described by `config`.
    ///
    /// Star placement is random unless `config.seed` is set. The config is
    /// validated first, so out-of-range values never reach the generators.
    pub fn from_config(config: &SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let stars = match config.seed {
            Some(seed) => particle_cloud(&mut StdRng::seed_from_u64(seed), PARTICLE_COUNT),
            None => particle_cloud(&mut rand::rng(), PARTICLE_COUNT),
        };

        let t = &config.torus;
        let torus = PointCloud {
            name: "torus",
            positions: torus_points(t.radius, t.tube, t.radial_segments, t.tubular_segments),
            material: PointMaterial {
                size: t.point_size,
                color: Color::from_hex(&t.color)?,
                texture: None,
                transparent: false,
            },
            rotation: Rotation::default(),
        };

        let stars = PointCloud {
            name: "stars",
            positions: stars,
            material: PointMaterial {
                size: config.stars.point_size,
                color: Color::from_hex(&config.stars.color)?,
                texture: config.stars.texture.clone(),
                transparent: true,
            },
            rotation: Rotation::default(),
        };

        let light = PointLight {
            position: Vec3::from_array(config.light.position),
            color: Color::from_hex(&config.light.color)?,
            intensity: config.light.intensity,
        };

        tracing::debug!(
            torus_points = torus.len(),
            star_points = stars.len(),
            seed = ?config.seed,
            "scene built"
        );

        Ok(Self {
            torus,
            stars,
            light,
            background: config.background_color()?,
            motion: config.motion,
            elapsed: 0.0,
            frames: 0,
        })
    }

    /// Build the default scene with a fixed star seed.
    pub fn with_seed(seed: u64) -> Result<Self, ConfigError> {
        Self::from_config(&SceneConfig {
            seed: Some(seed),
            ..SceneConfig::default()
        })
    }

    /// Apply one frame's rotations for the given elapsed time and pointer.
    pub fn animate(&mut self, elapsed: f32, pointer: PointerState) {
        let r = frame_rotations(elapsed, pointer, &self.motion);
        self.torus.rotation.y = r.torus_y;
        self.stars.rotation.y = r.stars_y;
        if let Some(x) = r.stars_x {
            self.stars.rotation.x = x;
        }
        self.elapsed = elapsed;
        self.frames += 1;
    }

    /// Clouds in draw order.
    pub fn clouds(&self) -> [&PointCloud; 2] {
        [&self.torus, &self.stars]
    }

    /// Elapsed time passed to the last [`Scene::animate`] call.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of frames animated so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}
