use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::DVec2;
use gridview_input::{InputEvent, PointerButton};
use gridview_render::DebugTextRenderer;
use gridview_scene::{ConfigOverrides, Scene, SceneConfig};
use gridview_stream::VisibilityCuller;
use gridview_common::CellCoord;
use gridview_tools::{SceneInspector, load_highlights, random_cells};
use gridview_viewport::Camera;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridview-cli", about = "Headless tools for the grid viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML scene configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Grid height in cells
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Number of highlighted cells
    #[arg(long, global = true)]
    highlights: Option<usize>,

    /// Seed for the highlight feed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// JSON array of {"x", "y"} cells to highlight instead of the seeded feed
    #[arg(long, global = true)]
    highlights_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the resolved configuration
    Info,
    /// Print view bounds and projection for a camera placement
    Bounds {
        #[arg(long, default_value = "1.0")]
        zoom: f64,
        /// Center x; defaults to the grid middle
        #[arg(long)]
        center_x: Option<f64>,
        /// Center y; defaults to the grid middle
        #[arg(long)]
        center_y: Option<f64>,
        #[arg(long, default_value = "1280")]
        viewport_width: u32,
        #[arg(long, default_value = "720")]
        viewport_height: u32,
    },
    /// Replay a scripted pan/zoom session through the debug renderer
    Scenario {
        /// Print every drawn frame
        #[arg(long)]
        frames: bool,
    },
    /// Time visibility culling while panning across the grid
    Cull {
        #[arg(short, long, default_value = "200")]
        iterations: usize,
        /// Zoom used for the panning window
        #[arg(long, default_value = "4.0")]
        zoom: f64,
    },
}

/// One step of the scripted session: an event followed by a frame request
/// `after` the previous one.
struct Step {
    event: Option<InputEvent>,
    after: Duration,
}

fn script() -> Vec<Step> {
    let frame = Duration::from_millis(17);
    let center = DVec2::new(640.0, 360.0);
    let mut steps = vec![Step {
        event: Some(InputEvent::Resize {
            width: 1280,
            height: 720,
        }),
        after: frame,
    }];
    for _ in 0..5 {
        steps.push(Step {
            event: Some(InputEvent::Wheel {
                position: DVec2::new(300.0, 200.0),
                delta: 120.0,
            }),
            after: frame,
        });
    }
    steps.push(Step {
        event: Some(InputEvent::PointerDown {
            position: center,
            button: PointerButton::Primary,
        }),
        after: frame,
    });
    for i in 1..=10 {
        steps.push(Step {
            event: Some(InputEvent::PointerMove {
                position: center + DVec2::new(i as f64 * 25.0, i as f64 * 10.0),
            }),
            after: frame,
        });
    }
    steps.push(Step {
        event: Some(InputEvent::PointerUp {
            position: center + DVec2::new(250.0, 100.0),
            button: PointerButton::Primary,
        }),
        after: frame,
    });
    // Idle requests closer together than the frame interval are throttled.
    for _ in 0..3 {
        steps.push(Step {
            event: None,
            after: Duration::from_millis(3),
        });
    }
    steps.push(Step {
        event: Some(InputEvent::Wheel {
            position: center,
            delta: 0.0,
        }),
        after: Duration::from_millis(3),
    });
    steps.push(Step {
        event: Some(InputEvent::ResetView),
        after: frame,
    });
    steps
}

/// Startup highlights: the file when given, else the seeded feed.
fn initial_cells(config: &SceneConfig, highlights_file: Option<&Path>) -> Result<Vec<CellCoord>> {
    let grid = &config.grid;
    match highlights_file {
        Some(path) => {
            let loaded = load_highlights(path, grid)
                .with_context(|| format!("load highlights from {}", path.display()))?;
            Ok(loaded.cells)
        }
        None => Ok(random_cells(grid, grid.highlight_count(), config.feed.seed)),
    }
}

fn run_scenario(config: &SceneConfig, cells: Vec<CellCoord>, print_frames: bool) -> Result<()> {
    let mut scene = Scene::new(config)?;
    scene.set_highlights(cells);
    let mut renderer = DebugTextRenderer::new();

    let mut now = Instant::now();
    for step in script() {
        if let Some(event) = step.event {
            let consumed = scene.handle_event(event);
            tracing::debug!(?event, consumed, "event");
        }
        now += step.after;
        if let Some(output) = scene.tick(&mut renderer, now) {
            if print_frames {
                print!("{output}");
            }
        }
    }

    println!("{}", SceneInspector::summary(&scene));
    println!(
        "Renderer: frames={} uploads={}",
        renderer.frame_count(),
        renderer.upload_count()
    );
    Ok(())
}

fn run_cull(config: &SceneConfig, cells: &[CellCoord], iterations: usize, zoom: f64) {
    let grid = &config.grid;
    let highlights: Vec<_> = cells.iter().map(|c| c.lower_left()).collect();

    let mut camera = Camera::new(grid, config.camera);
    camera.set_viewport(1280, 720);
    let mut culler = VisibilityCuller::new(config.cull);
    let iterations = iterations.max(1);
    let extent = grid.extent();

    let start = Instant::now();
    for i in 0..iterations {
        let t = i as f64 / iterations as f64;
        camera.look_at(extent * t, zoom);
        culler.refresh(&highlights, camera.view_bounds());
    }
    let elapsed = start.elapsed();
    let stats = culler.stats();

    println!(
        "Cull: {} highlights, zoom={}, {} iterations",
        highlights.len(),
        camera.zoom(),
        iterations
    );
    println!(
        "  total={elapsed:?} per_pass={:?} last_pass={:?}",
        elapsed / iterations as u32,
        stats.last_pass_time
    );
    println!(
        "  passes={} skipped={} uploads={} last_visible={}",
        stats.passes, stats.skipped_passes, stats.uploads, stats.last_visible
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let overrides = ConfigOverrides {
        width: cli.width,
        height: cli.height,
        highlights: cli.highlights,
        seed: cli.seed,
    };
    let config = SceneConfig::resolve(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Info => {
            println!("gridview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", gridview_render::crate_info());
            println!("tools: {}", gridview_tools::crate_info());
            print!("{}", config.to_yaml_string()?);
        }
        Commands::Bounds {
            zoom,
            center_x,
            center_y,
            viewport_width,
            viewport_height,
        } => {
            let mut camera = Camera::new(&config.grid, config.camera);
            camera.set_viewport(viewport_width, viewport_height);
            let middle = config.grid.center();
            camera.look_at(
                DVec2::new(center_x.unwrap_or(middle.x), center_y.unwrap_or(middle.y)),
                zoom,
            );
            let (l, r, b, t) = camera.view_bounds().as_tuple();
            println!(
                "Camera: zoom={} center=({}, {}) aspect={:.4}",
                camera.zoom(),
                camera.center().x,
                camera.center().y,
                camera.aspect()
            );
            println!("Bounds: left={l} right={r} bottom={b} top={t}");
            println!("Projection:");
            for row in camera.projection().transpose().to_cols_array_2d() {
                println!(
                    "  [{:>10.6} {:>10.6} {:>10.6} {:>10.6}]",
                    row[0], row[1], row[2], row[3]
                );
            }
        }
        Commands::Scenario { frames } => {
            let cells = initial_cells(&config, cli.highlights_file.as_deref())?;
            run_scenario(&config, cells, frames)?;
        }
        Commands::Cull { iterations, zoom } => {
            let cells = initial_cells(&config, cli.highlights_file.as_deref())?;
            run_cull(&config, &cells, iterations, zoom);
        }
    }

    Ok(())
}
