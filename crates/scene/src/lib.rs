//! Scene Graph Builder and Frame Updater.
//!
//! Builds the torus point cloud, the star cloud, and the point light once,
//! then maps elapsed time and pointer position to cloud rotations each frame.
//!
//! # Invariants
//! - The star cloud always holds exactly 5000 particles.
//! - Rotations change only through [`Scene::animate`].
//! - [`frame_rotations`] is a pure function of its inputs.

pub mod animate;
pub mod geometry;
mod scene;

pub use animate::{FrameRotations, frame_rotations};
pub use geometry::{PARTICLE_COUNT, particle_cloud, torus_points};
pub use scene::{PointCloud, PointLight, PointMaterial, Scene};

pub fn crate_info() -> &'static str {
    "nebula-scene v0.1.0"
}
