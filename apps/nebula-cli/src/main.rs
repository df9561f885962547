use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use nebula_common::{SceneConfig, ViewportSize};
use nebula_input::PointerTracker;
use nebula_render::{DebugTextRenderer, FrameLoop, PerspectiveCamera, Renderer, SteppedClock, Viewport};
use nebula_scene::Scene;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nebula-cli", about = "Headless runner for the nebula scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON scene configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the frame loop without a window and print the final scene
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds added to the clock per frame
        #[arg(short, long, default_value = "0.016666668")]
        step: f32,
        /// Pointer position as X,Y (client pixels)
        #[arg(short, long, value_parser = parse_pointer)]
        pointer: Option<(f32, f32)>,
        /// Seed for star placement
        #[arg(long)]
        seed: Option<u64>,
        /// Viewport as WIDTHxHEIGHT
        #[arg(long, default_value = "800x600", value_parser = parse_size)]
        size: ViewportSize,
    },
    /// Print the effective configuration as JSON
    Config,
}

fn parse_pointer(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("bad X: {e}"))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("bad Y: {e}"))?;
    Ok((x, y))
}

fn parse_size(s: &str) -> Result<ViewportSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height: {e}"))?;
    Ok(ViewportSize::new(w, h))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

/// Result of a headless run.
struct Simulation {
    scene: Scene,
    camera: PerspectiveCamera,
    viewport: Viewport,
    frames: u64,
}

/// Animate the scene for `frames` frames on a stepped clock, with the
/// pointer held at `pointer` if given.
fn simulate(
    config: &SceneConfig,
    frames: u64,
    step: f32,
    pointer: Option<(f32, f32)>,
    size: ViewportSize,
) -> anyhow::Result<Simulation> {
    if !(step.is_finite() && step >= 0.0) {
        bail!("step must be a non-negative number of seconds, got {step}");
    }

    let mut scene = Scene::from_config(config)?;
    let mut camera = PerspectiveCamera::from_config(&config.camera, 1.0);
    let viewport = Viewport::new(size, 1.0, &mut camera);
    let mut tracker = PointerTracker::new();
    if let Some((x, y)) = pointer {
        tracker.on_pointer_move(x, y);
    }

    let mut frame_loop = FrameLoop::new();
    let cancel = frame_loop.cancel_handle();
    if frames == 0 {
        cancel.cancel();
    }
    let mut clock = SteppedClock::new(step);
    let ran = frame_loop.run(&mut clock, |t| {
        scene.animate(t, tracker.pointer());
        tracing::debug!(
            t,
            torus_y = scene.torus.rotation.y,
            stars_x = scene.stars.rotation.x,
            stars_y = scene.stars.rotation.y,
            "frame"
        );
        if scene.frame_count() >= frames {
            cancel.cancel();
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(Simulation {
        scene,
        camera,
        viewport,
        frames: ran,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("nebula-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene: {}", nebula_scene::crate_info());
            println!("render: {}", nebula_render::crate_info());
            println!("input: {}", nebula_input::crate_info());
            println!("particles: {}", nebula_scene::PARTICLE_COUNT);
        }
        Commands::Simulate {
            frames,
            step,
            pointer,
            seed,
            size,
        } => {
            if seed.is_some() {
                config.seed = seed;
            }
            let run = simulate(&config, frames, step, pointer, size)?;
            let (w, h) = run.viewport.output_size();
            println!("Simulated {} frames at {w}x{h}", run.frames);
            print!("{}", DebugTextRenderer::new().render(&run.scene, &run.camera));
        }
        Commands::Config => {
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pointer() {
        assert_eq!(parse_pointer("200,100"), Ok((200.0, 100.0)));
        assert_eq!(parse_pointer(" 1.5 , -2 "), Ok((1.5, -2.0)));
        assert!(parse_pointer("200").is_err());
        assert!(parse_pointer("a,b").is_err());
    }

    #[test]
    fn parses_size() {
        assert_eq!(parse_size("800x600"), Ok(ViewportSize::new(800, 600)));
        assert_eq!(parse_size("1024X768"), Ok(ViewportSize::new(1024, 768)));
        assert!(parse_size("800").is_err());
    }

    fn seeded() -> SceneConfig {
        SceneConfig {
            seed: Some(1),
            ..SceneConfig::default()
        }
    }

    #[test]
    fn simulate_stops_after_requested_frames() {
        let run = simulate(&seeded(), 3, 5.0, Some((200.0, 100.0)), ViewportSize::new(800, 600))
            .unwrap();
        assert_eq!(run.frames, 3);
        assert_eq!(run.scene.frame_count(), 3);
        assert!((run.scene.elapsed() - 10.0).abs() < 1e-6);
        assert!((run.scene.torus.rotation.y - 5.0).abs() < 1e-5);
        assert!((run.scene.stars.rotation.x + 0.08).abs() < 1e-6);
        assert!((run.scene.stars.rotation.y + 0.16).abs() < 1e-6);
        assert_eq!(run.camera.aspect, 800.0 / 600.0);
        assert_eq!(run.viewport.output_size(), (800, 600));
    }

    #[test]
    fn simulate_without_pointer_drifts() {
        let run = simulate(&seeded(), 2, 5.0, None, ViewportSize::new(800, 600)).unwrap();
        assert!((run.scene.stars.rotation.y + 0.5).abs() < 1e-6);
        assert_eq!(run.scene.stars.rotation.x, 0.0);
    }

    #[test]
    fn simulate_zero_frames_draws_nothing() {
        let run = simulate(&seeded(), 0, 1.0, None, ViewportSize::new(800, 600)).unwrap();
        assert_eq!(run.frames, 0);
        assert_eq!(run.scene.frame_count(), 0);
    }

    #[test]
    fn simulate_rejects_bad_step() {
        assert!(simulate(&seeded(), 1, f32::NAN, None, ViewportSize::new(1, 1)).is_err());
        assert!(simulate(&seeded(), 1, -1.0, None, ViewportSize::new(1, 1)).is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_args() {
        let cli = Cli::try_parse_from([
            "nebula-cli",
            "simulate",
            "--frames",
            "10",
            "--pointer",
            "200,100",
            "--seed",
            "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate {
                frames,
                pointer,
                seed,
                size,
                ..
            } => {
                assert_eq!(frames, 10);
                assert_eq!(pointer, Some((200.0, 100.0)));
                assert_eq!(seed, Some(4));
                assert_eq!(size, ViewportSize::new(800, 600));
            }
            _ => panic!("expected simulate"),
        }
    }
}
