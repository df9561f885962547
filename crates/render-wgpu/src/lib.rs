//! wgpu render backend for nebula.
//!
//! Draws each point cloud as instanced, camera-facing sprites so point size
//! is honoured on every backend (wgpu point lists are fixed at one pixel).
//!
//! # Invariants
//! - Renderer never mutates scene rotations.
//! - A missing sprite image never stops rendering; the built-in sprite stands in.

mod gpu;
mod shaders;
mod texture;

pub use gpu::{RenderError, WgpuRenderer};
pub use texture::{SpriteImage, SpriteTexture, TextureError};
