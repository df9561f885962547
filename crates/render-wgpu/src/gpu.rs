use crate::shaders;
use crate::texture::{SpriteImage, SpriteTexture};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use nebula_render::PerspectiveCamera;
use nebula_scene::{PointCloud, Scene};
use wgpu::util::DeviceExt;

/// Smallest sprite drawn, in framebuffer pixels.
const MIN_POINT_PIXELS: f32 = 1.0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CloudUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PointInstance {
    position: [f32; 3],
}

/// Errors from acquiring a frame to draw into.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The surface must be reconfigured before the next frame.
    #[error("surface needs reconfiguring: {0}")]
    Reconfigure(wgpu::SurfaceError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    /// Sort a surface error into recoverable and fatal cases.
    pub fn from_surface(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigure(err),
            other => Self::Surface(other),
        }
    }
}

/// GPU resources for one point cloud.
struct GpuCloud {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    point_count: u32,
    transparent: bool,
}

/// wgpu point-cloud renderer.
pub struct WgpuRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    clouds: Vec<GpuCloud>,
    depth_texture: wgpu::TextureView,
    clear_color: wgpu::Color,
}

impl WgpuRenderer {
    /// Create the pipelines and upload both clouds of `scene`.
    ///
    /// Textured clouds load their sprite from disk; a missing or broken
    /// file falls back to the built-in sprite.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        scene: &Scene,
        width: u32,
        height: u32,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cloud_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("points_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("points_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::POINTS_SHADER.into()),
        });

        let opaque_pipeline =
            create_points_pipeline(device, &pipeline_layout, &shader, surface_format, false);
        let transparent_pipeline =
            create_points_pipeline(device, &pipeline_layout, &shader, surface_format, true);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let clouds = scene
            .clouds()
            .iter()
            .map(|cloud| Self::upload_cloud(device, queue, &bind_group_layout, &sampler, cloud))
            .collect();

        let [r, g, b] = scene.background.to_linear();
        let clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            opaque_pipeline,
            transparent_pipeline,
            clouds,
            depth_texture,
            clear_color,
        }
    }

    fn upload_cloud(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        cloud: &PointCloud,
    ) -> GpuCloud {
        let instances: Vec<PointInstance> = cloud
            .positions
            .iter()
            .map(|p| PointInstance {
                position: p.to_array(),
            })
            .collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(cloud.name),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cloud_uniform_buffer"),
            contents: bytemuck::bytes_of(&CloudUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                model: Mat4::IDENTITY.to_cols_array_2d(),
                color: [1.0; 4],
                params: [0.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let image = match &cloud.material.texture {
            Some(path) => SpriteImage::load_or_fallback(path),
            None => SpriteImage::white(),
        };
        let sprite = SpriteTexture::upload(device, queue, &image, cloud.name);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cloud_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sprite.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        GpuCloud {
            uniform_buffer,
            bind_group,
            instance_buffer,
            point_count: instances.len() as u32,
            transparent: cloud.material.transparent,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame: both point clouds with their current rotations.
    ///
    /// `framebuffer` is the target size in physical pixels.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &PerspectiveCamera,
        scene: &Scene,
        framebuffer: (u32, u32),
    ) {
        let vp = camera.view_projection().to_cols_array_2d();
        for (gpu, cloud) in self.clouds.iter().zip(scene.clouds()) {
            queue.write_buffer(
                &gpu.uniform_buffer,
                0,
                bytemuck::bytes_of(&cloud_uniforms(vp, cloud, framebuffer)),
            );
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for i in draw_order(self.clouds.iter().map(|c| c.transparent)) {
                let gpu = &self.clouds[i];
                if gpu.point_count == 0 {
                    continue;
                }
                pass.set_pipeline(if gpu.transparent {
                    &self.transparent_pipeline
                } else {
                    &self.opaque_pipeline
                });
                pass.set_bind_group(0, &gpu.bind_group, &[]);
                pass.set_vertex_buffer(0, gpu.instance_buffer.slice(..));
                pass.draw(0..6, 0..gpu.point_count);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// Sprite pipeline. Transparent clouds blend over what is already drawn
/// and leave the depth buffer untouched, so overlapping sprites do not
/// punch holes in each other.
fn create_points_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    transparent: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if transparent {
            "points_transparent_pipeline"
        } else {
            "points_opaque_pipeline"
        }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_points"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_points"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: !transparent,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// Indices of clouds in draw order: opaque first, then transparent, each
/// group keeping scene order.
fn draw_order(transparent: impl Iterator<Item = bool> + Clone) -> Vec<usize> {
    let opaque = transparent.clone().enumerate().filter(|(_, t)| !t);
    let blended = transparent.enumerate().filter(|(_, t)| *t);
    opaque.chain(blended).map(|(i, _)| i).collect()
}

fn cloud_uniforms(view_proj: [[f32; 4]; 4], cloud: &PointCloud, framebuffer: (u32, u32)) -> CloudUniforms {
    let m = &cloud.material;
    let [r, g, b] = m.color.to_linear();
    CloudUniforms {
        view_proj,
        model: cloud.model_matrix().to_cols_array_2d(),
        color: [r, g, b, 1.0],
        params: [
            m.size,
            MIN_POINT_PIXELS,
            framebuffer.0.max(1) as f32,
            framebuffer.1.max(1) as f32,
        ],
    }
}
