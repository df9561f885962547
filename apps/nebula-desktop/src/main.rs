use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use nebula_common::{SceneConfig, ViewportSize};
use nebula_input::{Action, PointerState, PointerTracker};
use nebula_render::{FrameLoop, PerspectiveCamera, SystemClock, Viewport};
use nebula_render_wgpu::{RenderError, WgpuRenderer};
use nebula_scene::Scene;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "nebula-desktop", about = "Rotating torus and starfield")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON scene configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for star placement
    #[arg(long)]
    seed: Option<u64>,

    /// Star sprite image (overrides the config file)
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Start with the debug overlay hidden
    #[arg(long)]
    no_overlay: bool,
}

/// Debug overlay state and frame-rate counter.
struct Overlay {
    visible: bool,
    frames_since_update: usize,
    last_fps_update: Instant,
    fps: f64,
}

impl Overlay {
    fn new(visible: bool) -> Self {
        Self {
            visible,
            frames_since_update: 0,
            last_fps_update: Instant::now(),
            fps: 0.0,
        }
    }

    fn count_frame(&mut self) {
        self.frames_since_update += 1;
        let now = Instant::now();
        let secs = now.duration_since(self.last_fps_update).as_secs_f64();
        if secs >= 1.0 {
            self.fps = self.frames_since_update as f64 / secs;
            self.frames_since_update = 0;
            self.last_fps_update = now;
        }
    }

    fn show(&self, ctx: &EguiContext, scene: &Scene, viewport: &Viewport, pointer: PointerState) {
        if !self.visible {
            return;
        }

        egui::Window::new("Nebula")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Elapsed: {:.2}s  FPS: {:.1}", scene.elapsed(), self.fps));
                ui.label(format!("Pointer: ({:.0}, {:.0})", pointer.x, pointer.y));
                ui.separator();
                for cloud in scene.clouds() {
                    let r = cloud.rotation;
                    ui.label(format!(
                        "{}: {} points, rot ({:.3}, {:.3}, {:.3})",
                        cloud.name,
                        cloud.len(),
                        r.x,
                        r.y,
                        r.z
                    ));
                }
                ui.separator();
                let size = viewport.size();
                let (fw, fh) = viewport.framebuffer_size();
                ui.label(format!(
                    "Viewport: {}x{} @{:.1}x ({fw}x{fh})",
                    size.width,
                    size.height,
                    viewport.pixel_ratio()
                ));
                ui.small("F1: Toggle overlay | Esc: Quit");
            });
    }
}

/// Application state.
struct AppState {
    scene: Scene,
    camera: PerspectiveCamera,
    viewport: Viewport,
    pointer: PointerTracker,
    frame_loop: FrameLoop,
    clock: SystemClock,
    overlay: Overlay,
}

impl AppState {
    fn new(config: &SceneConfig, show_overlay: bool) -> Result<Self> {
        let scene = Scene::from_config(config)?;
        let mut camera = PerspectiveCamera::from_config(&config.camera, 1.0);
        let viewport = Viewport::new(ViewportSize::default(), 1.0, &mut camera);
        Ok(Self {
            scene,
            camera,
            viewport,
            pointer: PointerTracker::new(),
            frame_loop: FrameLoop::new(),
            clock: SystemClock::default(),
            overlay: Overlay::new(show_overlay),
        })
    }

    /// Apply an action. Returns the new framebuffer size after a resize.
    fn handle_action(&mut self, action: Action) -> Option<(u32, u32)> {
        match action {
            Action::PointerMoved(_) => {
                self.pointer.apply(&action);
                None
            }
            Action::Resize {
                width,
                height,
                scale_factor,
            } => {
                let size = ViewportSize::new(width, height);
                let framebuffer = self.viewport.resize(size, scale_factor, &mut self.camera);
                tracing::info!(
                    "resized to {width}x{height} (framebuffer {}x{})",
                    framebuffer.0,
                    framebuffer.1
                );
                Some(framebuffer)
            }
            Action::ToggleOverlay => {
                self.overlay.visible = !self.overlay.visible;
                None
            }
            Action::Quit => {
                self.frame_loop.cancel_handle().cancel();
                None
            }
            Action::Noop => None,
        }
    }
}

/// Map a window event to an action.
fn map_window_event(event: &WindowEvent, window: &Window) -> Action {
    let scale_factor = window.scale_factor();
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            let logical = position.to_logical::<f32>(scale_factor);
            Action::PointerMoved(Vec2::new(logical.x, logical.y))
        }
        WindowEvent::Resized(size) => resize_action(*size, scale_factor),
        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
            resize_action(window.inner_size(), *scale_factor)
        }
        WindowEvent::CloseRequested => Action::Quit,
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } => match key {
            KeyCode::F1 => Action::ToggleOverlay,
            KeyCode::Escape => Action::Quit,
            _ => Action::Noop,
        },
        _ => Action::Noop,
    }
}

fn resize_action(size: PhysicalSize<u32>, scale_factor: f64) -> Action {
    let logical = logical_size(size, scale_factor);
    Action::Resize {
        width: logical.width,
        height: logical.height,
        scale_factor: scale_factor as f32,
    }
}

fn logical_size(size: PhysicalSize<u32>, scale_factor: f64) -> ViewportSize {
    let logical = size.to_logical::<u32>(scale_factor);
    ViewportSize::new(logical.width, logical.height)
}

/// egui zoom that makes its pixels-per-point equal the clamped pixel ratio
/// the surface is sized with.
fn overlay_zoom(pixel_ratio: f32, native_scale: f32) -> f32 {
    if native_scale > 0.0 && native_scale.is_finite() {
        pixel_ratio / native_scale
    } else {
        1.0
    }
}

/// Window, device and renderers; created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_ctx: EguiContext,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, state: &mut AppState) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Nebula")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("nebula_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let scale_factor = window.scale_factor();
        let (fb_width, fb_height) = state.viewport.resize(
            logical_size(window.inner_size(), scale_factor),
            scale_factor as f32,
            &mut state.camera,
        );

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: fb_width,
            height: fb_height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            &state.scene,
            fb_width,
            fb_height,
        );

        let egui_ctx = EguiContext::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_ctx,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, (width, height): (u32, u32)) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Draw the scene and the overlay, then present.
    fn draw(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        viewport: &Viewport,
        overlay: &Overlay,
        pointer: PointerState,
    ) -> Result<(), RenderError> {
        let output = self
            .surface
            .get_current_texture()
            .map_err(RenderError::from_surface)?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            camera,
            scene,
            (self.config.width, self.config.height),
        );

        self.egui_ctx.set_zoom_factor(overlay_zoom(
            viewport.pixel_ratio(),
            self.window.scale_factor() as f32,
        ));
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            overlay.show(ctx, scene, viewport, pointer);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        Ok(())
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self { state, gpu: None }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let AppState {
            scene,
            camera,
            viewport,
            pointer,
            frame_loop,
            clock,
            overlay,
        } = &mut self.state;

        let pointer = pointer.pointer();
        let result = frame_loop.step(&*clock, |t| {
            scene.animate(t, pointer);
            overlay.count_frame();
            gpu.draw(scene, camera, viewport, overlay, pointer)
        });

        match result {
            Ok(true) => {}
            Ok(false) => {
                event_loop.exit();
                return;
            }
            Err(RenderError::Reconfigure(e)) => {
                tracing::debug!("reconfiguring surface: {e}");
                gpu.reconfigure();
            }
            Err(e) => tracing::error!("{e}"),
        }
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &mut self.state) {
            Ok(gpu) => {
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to start renderer: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed && matches!(event, WindowEvent::KeyboardInput { .. }) {
            return;
        }

        if let WindowEvent::RedrawRequested = event {
            self.redraw(event_loop);
            return;
        }

        let action = map_window_event(&event, &gpu.window);
        if let Some(framebuffer) = self.state.handle_action(action) {
            gpu.resize(framebuffer);
        }
        if self.state.frame_loop.is_cancelled() {
            tracing::info!("frame loop cancelled after {} frames", self.state.frame_loop.frames());
            event_loop.exit();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(texture) = cli.texture {
        config.stars.texture = Some(texture);
    }

    tracing::info!("nebula-desktop starting");

    let state = AppState::new(&config, !cli.no_overlay)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let config = SceneConfig {
            seed: Some(3),
            ..SceneConfig::default()
        };
        AppState::new(&config, true).unwrap()
    }

    #[test]
    fn pointer_action_updates_tracker() {
        let mut state = state();
        state.handle_action(Action::PointerMoved(Vec2::new(100.0, 50.0)));
        assert_eq!(state.pointer.pointer(), PointerState::new(100.0, 50.0));
    }

    #[test]
    fn resize_action_updates_camera() {
        let mut state = state();
        let fb = state.handle_action(Action::Resize {
            width: 800,
            height: 600,
            scale_factor: 1.0,
        });
        assert_eq!(fb, Some((800, 600)));
        assert_eq!(state.camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn quit_cancels_frame_loop() {
        let mut state = state();
        assert!(!state.frame_loop.is_cancelled());
        state.handle_action(Action::Quit);
        assert!(state.frame_loop.is_cancelled());
    }

    #[test]
    fn toggle_overlay() {
        let mut state = state();
        state.handle_action(Action::ToggleOverlay);
        assert!(!state.overlay.visible);
    }

    #[test]
    fn overlay_matches_clamped_framebuffer() {
        let mut state = state();
        let fb = state.handle_action(Action::Resize {
            width: 800,
            height: 600,
            scale_factor: 3.0,
        });
        assert_eq!(fb, Some((1600, 1200)));

        let pixels_per_point = 3.0 * overlay_zoom(state.viewport.pixel_ratio(), 3.0);
        assert!((pixels_per_point - 2.0).abs() < 1e-6);
        assert!((1600.0 / pixels_per_point - 800.0).abs() < 1e-3);

        assert_eq!(overlay_zoom(1.5, 1.5), 1.0);
        assert_eq!(overlay_zoom(2.0, 0.0), 1.0);
    }

    #[test]
    fn resize_action_converts_to_logical() {
        let action = resize_action(PhysicalSize::new(1600, 1200), 2.0);
        assert_eq!(
            action,
            Action::Resize {
                width: 800,
                height: 600,
                scale_factor: 2.0
            }
        );
    }
}
