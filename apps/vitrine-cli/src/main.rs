use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vitrine_common::Viewport;
use vitrine_render::DebugTextRenderer;
use vitrine_runtime::{Demo, Stage};
use vitrine_tools::SceneInspector;

#[derive(Parser)]
#[command(name = "vitrine-cli", about = "Headless host for the vitrine demo gallery")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory textures, models and fonts are read from
    #[arg(long, default_value = "./assets", global = true)]
    assets_dir: PathBuf,

    #[arg(long, default_value_t = 1280, global = true)]
    width: u32,

    #[arg(long, default_value_t = 720, global = true)]
    height: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every demo in gallery order
    List,
    /// Mount a demo and run frames through the text renderer
    Run {
        #[arg(short, long)]
        demo: String,
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u32,
        /// Simulated time between frames, in milliseconds
        #[arg(long, default_value_t = 1000.0 / 60.0)]
        frame_ms: f64,
        /// Print only the final summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Mount a demo, wait for its assets and print its scene
    Inspect {
        #[arg(short, long)]
        demo: String,
    },
}

/// Mount `demo` and block until its asset loads are in.
fn mount(stage: &mut Stage, demo: &dyn Demo) -> anyhow::Result<usize> {
    stage.mount(demo)?;
    let applied = stage.finish_loads();
    tracing::info!("mounted {} ({applied} asset load(s) applied)", demo.name());
    Ok(applied)
}

/// Tick `frames` times, `frame_ms` apart, collecting each frame's dump.
fn run_frames(
    stage: &mut Stage,
    renderer: &mut DebugTextRenderer,
    frames: u32,
    frame_ms: f64,
) -> Vec<String> {
    (0..frames)
        .filter_map(|i| stage.on_refresh(f64::from(i) * frame_ms, renderer))
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let viewport = Viewport::new(cli.width, cli.height);
    let mut stage = Stage::new(&cli.assets_dir, viewport);

    match cli.command {
        Commands::List => {
            for demo in vitrine_demos::all() {
                println!("{:<20} {}", demo.name(), demo.title());
            }
        }
        Commands::Run {
            demo,
            frames,
            frame_ms,
            quiet,
        } => {
            let demo = vitrine_demos::find(&demo)?;
            let mut renderer = DebugTextRenderer::new();
            stage.on_resize(viewport.width, viewport.height, &mut renderer);
            let applied = mount(&mut stage, demo.as_ref())?;
            println!("{}: {applied} asset load(s) applied", demo.name());

            for output in run_frames(&mut stage, &mut renderer, frames, frame_ms) {
                if !quiet {
                    print!("{output}");
                }
            }

            if let Some(frame_loop) = stage.frame_loop() {
                println!("{}", SceneInspector::summary(&frame_loop.scene));
                println!("Frames: {}  {}", frame_loop.frame(), frame_loop.stats());
                if let Some(physics) = &frame_loop.physics {
                    println!(
                        "Physics: bodies={} steps={}",
                        physics.body_count(),
                        physics.step_count()
                    );
                }
            }
            if stage.teardown() {
                tracing::info!("unmounted {}", demo.name());
            }
        }
        Commands::Inspect { demo } => {
            let demo = vitrine_demos::find(&demo)?;
            let applied = mount(&mut stage, demo.as_ref())?;
            let Some(frame_loop) = stage.frame_loop() else {
                anyhow::bail!("{} did not mount", demo.name());
            };
            println!("{} ({})", demo.title(), demo.name());
            println!("Assets applied: {applied}");
            println!("{}", SceneInspector::summary(&frame_loop.scene));
            print!("{}", SceneInspector::tree(&frame_loop.scene));

            let controls = frame_loop.controls.controls();
            if !controls.is_empty() {
                println!("Controls:");
                for control in controls {
                    let folder = control.folder.as_deref().unwrap_or("-");
                    println!("  [{folder}] {} = {:?}", control.label, control.value());
                }
            }
            stage.teardown();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_produces_one_dump_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = Stage::new(dir.path(), Viewport::new(320, 240));
        let mut renderer = DebugTextRenderer::new();
        stage.on_resize(320, 240, &mut renderer);
        let demo = vitrine_demos::find("cube").unwrap();
        mount(&mut stage, demo.as_ref()).unwrap();

        let frames = run_frames(&mut stage, &mut renderer, 3, 16.0);
        assert_eq!(frames.len(), 3);
        assert!(frames[2].contains("=== Frame 3 (320x240) ==="));
        assert!(frames[0].contains("Draws: 1"));
    }

    #[test]
    fn nothing_runs_without_a_demo() {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = Stage::new(dir.path(), Viewport::default());
        let mut renderer = DebugTextRenderer::new();
        assert!(run_frames(&mut stage, &mut renderer, 5, 16.0).is_empty());
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn cli_parses_run() {
        let cli = Cli::try_parse_from(["vitrine-cli", "run", "--demo", "dominos", "-f", "10"]).unwrap();
        match cli.command {
            Commands::Run { demo, frames, .. } => {
                assert_eq!(demo, "dominos");
                assert_eq!(frames, 10);
            }
            _ => panic!("expected run"),
        }
        assert_eq!(cli.assets_dir, PathBuf::from("./assets"));
    }
}
