use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::DVec2;
use gridview_common::CellCoord;
use gridview_input::{InputEvent, PointerButton};
use gridview_render_wgpu::{RenderInitError, WgpuRenderer};
use gridview_scene::{ConfigOverrides, Scene, SceneConfig};
use gridview_tools::{SceneInspector, load_highlights, random_cells};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Wheel units reported per line of a line-based scroll device.
const WHEEL_UNITS_PER_LINE: f64 = 120.0;

#[derive(Parser)]
#[command(name = "gridview-desktop", about = "Pan/zoom viewer for large highlighted grids")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML scene configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<u32>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<u32>,

    /// Number of highlighted cells
    #[arg(long)]
    highlights: Option<usize>,

    /// Seed for the highlight feed
    #[arg(long)]
    seed: Option<u64>,

    /// JSON array of {"x", "y"} cells to highlight instead of the seeded feed
    #[arg(long)]
    highlights_file: Option<PathBuf>,
}

/// Application state.
struct AppState {
    scene: Scene,
    seed: u64,
    source: String,
    cursor: DVec2,
    show_hud: bool,
}

impl AppState {
    /// Highlights come from `highlights_file` when given, else the seeded feed.
    fn new(config: &SceneConfig, highlights_file: Option<&Path>) -> Result<Self> {
        let scene = Scene::new(config)?;
        let mut state = Self {
            scene,
            seed: config.feed.seed,
            source: String::new(),
            cursor: DVec2::ZERO,
            show_hud: true,
        };
        match highlights_file {
            Some(path) => state.load_file(path)?,
            None => state.reseed_with(config.feed.seed),
        }
        Ok(state)
    }

    fn reseed(&mut self) {
        self.reseed_with(self.seed.wrapping_add(1));
        tracing::info!(seed = self.seed, "highlights regenerated");
    }

    fn reseed_with(&mut self, seed: u64) {
        self.seed = seed;
        let grid = *self.scene.grid();
        self.scene
            .set_highlights(random_cells(&grid, grid.highlight_count(), seed));
        self.source = format!("seed {seed}");
    }

    /// Replace the highlights with the cells listed in a JSON file.
    fn load_file(&mut self, path: &Path) -> Result<()> {
        let grid = *self.scene.grid();
        let loaded = load_highlights(path, &grid)
            .with_context(|| format!("load highlights from {}", path.display()))?;
        self.scene.set_highlights(loaded.cells);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.source = format!("{name} ({} loaded, {} skipped)", loaded.loaded, loaded.skipped);
        Ok(())
    }

    fn clear(&mut self) {
        self.scene.clear_highlights();
        self.source = "cleared".to_string();
        tracing::info!("highlights cleared");
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::F1 => {
                self.show_hud = !self.show_hud;
                self.scene.request_redraw();
            }
            KeyCode::Home => {
                self.scene.handle_event(InputEvent::ResetView);
            }
            KeyCode::KeyR => self.reseed(),
            KeyCode::KeyC => self.clear(),
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        let summary = SceneInspector::summary(&self.scene);
        let (l, r, b, t) = summary.bounds.as_tuple();
        let under_cursor = cursor_label(
            self.scene.camera().screen_to_world(self.cursor),
            self.scene.cell_at(self.cursor),
        );

        egui::SidePanel::left("hud")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Grid Viewer");
                ui.separator();
                ui.label(format!("Grid: {}x{}", summary.grid.0, summary.grid.1));
                ui.label(format!("Zoom: {:.3}", summary.zoom));
                ui.label(format!(
                    "Center: ({:.1}, {:.1})",
                    summary.center.0, summary.center.1
                ));
                ui.label(format!("View x: [{l:.1}, {r:.1}]"));
                ui.label(format!("View y: [{b:.1}, {t:.1}]"));
                ui.label(under_cursor);
                ui.separator();

                ui.heading("Highlights");
                ui.label(format!(
                    "{} visible / {} total",
                    summary.visible, summary.highlights
                ));
                ui.label(format!("Source: {}", self.source));
                ui.separator();

                ui.heading("Frames");
                ui.label(format!("FPS: {:.1}", summary.fps));
                ui.label(format!("Avg frame: {:.2?}", summary.avg_frame));
                ui.label(format!(
                    "Drawn: {}  Skipped: {}",
                    summary.frames_drawn, summary.frames_skipped
                ));
                ui.label(format!(
                    "Uploads: {}  Cull passes: {}",
                    summary.uploads, summary.cull_passes
                ));
                ui.label(format!("Last cull: {:.2?}", summary.last_cull));
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Reset View (Home)").clicked() {
                        self.scene.reset_view();
                    }
                    if ui.button("Reseed (R)").clicked() {
                        self.reseed();
                    }
                });
                if ui.button("Clear Highlights (C)").clicked() {
                    self.clear();
                }

                ui.separator();
                ui.small("F1: Toggle HUD | LMB drag: Pan | Click: Toggle cell | Wheel: Zoom");
                ui.small("Drop a JSON file to load highlights");
            });
    }
}

/// HUD read-out for the world point and floored cell under the cursor.
fn cursor_label(world: DVec2, cell: Option<CellCoord>) -> String {
    match cell {
        Some(cell) => format!(
            "Cursor: ({:.1}, {:.1}) cell ({}, {})",
            world.x, world.y, cell.x, cell.y
        ),
        None => format!("Cursor: ({:.1}, {:.1}) off grid", world.x, world.y),
    }
}

/// Events that must end a drag even when the HUD consumed them, so the
/// scene never keeps panning after a release it did not see.
fn ends_drag(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::MouseInput {
            state: ElementState::Released,
            ..
        } | WindowEvent::CursorLeft { .. }
            | WindowEvent::Focused(false)
    )
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(n) => PointerButton::Other(n),
    }
}

fn wheel_units(delta: MouseScrollDelta) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64 * WHEEL_UNITS_PER_LINE,
        MouseScrollDelta::PixelDelta(pos) => pos.y,
    }
}

/// GPU objects created once the window exists.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title("Grid Viewer")
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
        .ok_or(RenderInitError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("gridview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
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
            width: size.width.max(1),
            height: size.height.max(1),
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

        self.state.scene.resize(size.width, size.height);

        let scene = &self.state.scene;
        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            scene.grid(),
            scene.palette(),
            scene.highlights().len(),
        )?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
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

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        if !self.state.scene.frame_due(now) {
            return;
        }
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut frame = gpu.renderer.frame(&gpu.device, &gpu.queue, &view);
        self.state.scene.tick(&mut frame, now);

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
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
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();

        if full_output
            .viewport_output
            .values()
            .any(|v| v.repaint_delay.is_zero())
        {
            self.state.scene.request_redraw();
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize renderer: {e:#}");
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
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.repaint {
                self.state.scene.request_redraw();
            }
            if response.consumed {
                if ends_drag(&event) {
                    self.state.scene.handle_pointer_cancel();
                }
                return;
            }
        }

        let scene = &mut self.state.scene;
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                }
                scene.resize(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.cursor = DVec2::new(position.x, position.y);
                scene.handle_pointer_move(self.state.cursor);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = pointer_button(button);
                let cursor = self.state.cursor;
                match state {
                    ElementState::Pressed => scene.handle_pointer_down(cursor, button),
                    ElementState::Released => scene.handle_pointer_up(cursor, button),
                };
            }
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                scene.handle_pointer_cancel();
            }
            WindowEvent::DroppedFile(path) => {
                if let Err(e) = self.state.load_file(&path) {
                    tracing::error!("{e:#}");
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                scene.handle_wheel(self.state.cursor, wheel_units(delta));
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let scene = &self.state.scene;
        if scene.frame_due(Instant::now()) {
            gpu.window.request_redraw();
        } else if let Some(last) = scene.scheduler().last_frame() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                last + scene.scheduler().frame_interval(),
            ));
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("gridview-desktop starting");

    let overrides = ConfigOverrides {
        width: cli.width,
        height: cli.height,
        highlights: cli.highlights,
        seed: cli.seed,
    };
    let config = SceneConfig::resolve(cli.config.as_deref(), overrides)?;
    let state = AppState::new(&config, cli.highlights_file.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
