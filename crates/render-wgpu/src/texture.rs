use std::path::{Path, PathBuf};

/// Errors from loading a sprite image.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {0:?} has no pixels")]
    Empty(PathBuf),
}

/// RGBA8 sprite pixels, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SpriteImage {
    /// Decode an image file into RGBA8.
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(path.to_path_buf()));
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    /// Load `path`, or fall back to [`SpriteImage::soft_star`] with a warning.
    pub fn load_or_fallback(path: &Path) -> Self {
        match Self::load(path) {
            Ok(img) => {
                tracing::info!(
                    "loaded sprite {} ({}x{})",
                    path.display(),
                    img.width,
                    img.height
                );
                img
            }
            Err(e) => {
                tracing::warn!("{e}; using built-in star sprite");
                Self::soft_star(32)
            }
        }
    }

    /// A single opaque white texel. Sampling it leaves the material colour as is.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }

    /// White disc whose alpha falls off towards the edge.
    pub fn soft_star(size: u32) -> Self {
        let size = size.max(2);
        let centre = (size as f32 - 1.0) / 2.0;
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 - centre) / centre;
                let dy = (y as f32 - centre) / centre;
                let falloff = (1.0 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                let alpha = (falloff * falloff * 255.0).round() as u8;
                rgba.extend_from_slice(&[255, 255, 255, alpha]);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }
}

/// A sprite uploaded to the GPU.
pub struct SpriteTexture {
    pub view: wgpu::TextureView,
}

impl SpriteTexture {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &SpriteImage,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );
        Self {
            view: texture.create_view(&Default::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_is_one_opaque_texel() {
        let img = SpriteImage::white();
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.rgba, vec![255, 255, 255, 255]);
    }

    #[test]
    fn soft_star_fades_to_transparent_corners() {
        let img = SpriteImage::soft_star(16);
        assert_eq!(img.rgba.len(), 16 * 16 * 4);
        let alpha = |x: u32, y: u32| img.rgba[((y * 16 + x) * 4 + 3) as usize];
        assert_eq!(alpha(0, 0), 0);
        assert_eq!(alpha(15, 15), 0);
        assert!(alpha(7, 7) > 200);
        assert!(alpha(7, 7) > alpha(3, 7));
    }

    #[test]
    fn missing_file_is_decode_error() {
        let err = SpriteImage::load(Path::new("/no/such/star.png")).unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
        assert!(err.to_string().contains("star.png"));
    }

    #[test]
    fn fallback_on_missing_file() {
        let img = SpriteImage::load_or_fallback(Path::new("/no/such/star.png"));
        assert_eq!(img, SpriteImage::soft_star(32));
    }

    #[test]
    fn loads_bundled_star_sprite() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/star.png");
        let img = SpriteImage::load(&path).unwrap();
        assert!(img.width > 0 && img.height > 0);
        assert_eq!(img.rgba.len(), (img.width * img.height * 4) as usize);
    }
}
