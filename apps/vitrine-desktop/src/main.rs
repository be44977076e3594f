mod panel;
mod pointer;

use anyhow::{Result, bail};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vitrine_common::Viewport;
use vitrine_render::{PerspectiveCamera, Renderer};
use vitrine_render_wgpu::{SurfaceFrame, SurfaceRenderer};
use vitrine_runtime::{Demo, Stage};
use vitrine_scene::Scene;
use vitrine_tools::SceneInspector;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "vitrine-desktop", about = "Vitrine demo gallery")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Demo to open first
    #[arg(short, long, default_value = "cube")]
    demo: String,

    /// Directory textures, models and fonts are read from
    #[arg(long, default_value = "./assets")]
    assets_dir: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// Everything that is not GPU plumbing.
struct AppState {
    stage: Stage,
    demos: Vec<Box<dyn Demo>>,
    selected: Option<usize>,
    /// Set by the panel, applied after the frame.
    switch_to: Option<usize>,
    show_panel: bool,
    started: Instant,
    /// Drawn while no demo is mounted.
    idle_scene: Scene,
    idle_camera: PerspectiveCamera,
}

impl AppState {
    fn new(assets_dir: PathBuf, viewport: Viewport) -> Self {
        Self {
            stage: Stage::new(assets_dir, viewport),
            demos: vitrine_demos::all(),
            selected: None,
            switch_to: None,
            show_panel: true,
            started: Instant::now(),
            idle_scene: Scene::new(),
            idle_camera: PerspectiveCamera::default(),
        }
    }

    fn mount(&mut self, index: usize) {
        let Some(demo) = self.demos.get(index) else {
            return;
        };
        self.selected = Some(index);
        if let Err(e) = self.stage.mount(demo.as_ref()) {
            tracing::error!(demo = demo.name(), "failed to build demo: {e}");
        }
    }

    fn title(&self) -> String {
        match self.selected.and_then(|i| self.demos.get(i)) {
            Some(demo) => format!("Vitrine - {}", demo.title()),
            None => "Vitrine".to_string(),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => self.show_panel = !self.show_panel,
            KeyCode::ArrowDown | KeyCode::PageDown => {
                let next = self.selected.map_or(0, |i| (i + 1) % self.demos.len());
                self.switch_to = Some(next);
            }
            KeyCode::ArrowUp | KeyCode::PageUp => {
                let n = self.demos.len();
                let prev = self.selected.map_or(0, |i| (i + n - 1) % n);
                self.switch_to = Some(prev);
            }
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if let Some(frame_loop) = self.stage.frame_loop() {
            egui::Area::new(egui::Id::new("stats"))
                .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(frame_loop.stats().to_string()).monospace());
                });
        }

        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("gallery")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Vitrine");
                ui.separator();

                ui.heading("Demos");
                for (i, demo) in self.demos.iter().enumerate() {
                    let is_selected = self.selected == Some(i);
                    if ui.selectable_label(is_selected, demo.title()).clicked() && !is_selected {
                        self.switch_to = Some(i);
                    }
                }

                ui.separator();
                let pending = self.stage.pending_loads();
                match self.stage.frame_loop_mut() {
                    Some(frame_loop) => {
                        let summary = SceneInspector::summary(&frame_loop.scene);
                        ui.label(format!("Frame: {}", frame_loop.frame()));
                        ui.label(format!(
                            "Nodes: {}  Meshes: {}  Lights: {}",
                            summary.nodes, summary.meshes, summary.lights
                        ));
                        ui.label(format!("Triangles: {}", summary.triangles));
                        if pending > 0 {
                            ui.label(format!("Loading {pending} asset(s)..."));
                        }
                        if let Some(physics) = &frame_loop.physics {
                            ui.label(format!(
                                "Bodies: {}  Steps: {}",
                                physics.body_count(),
                                physics.step_count()
                            ));
                        }

                        ui.separator();
                        ui.heading("Controls");
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            panel::controls_ui(ui, &mut frame_loop.controls);
                        });
                    }
                    None => {
                        ui.label("No demo mounted");
                    }
                }

                ui.separator();
                ui.small("F1: Toggle Panel | Up/Down: Switch | LMB: Orbit | RMB: Pan | Wheel: Zoom");
            });
    }
}

/// GPU-side state, created once the window exists.
struct Gpu {
    window: Arc<Window>,
    renderer: SurfaceRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    initial_size: PhysicalSize<u32>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState, initial_size: PhysicalSize<u32>) -> Self {
        Self {
            state,
            initial_size,
            gpu: None,
            egui_ctx: EguiContext::default(),
            fatal: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.state.title())
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        let viewport = Viewport::new(size.width, size.height);
        let mut renderer = SurfaceRenderer::new(window.clone(), viewport)?;
        self.state
            .stage
            .on_resize(viewport.width, viewport.height, &mut renderer);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(renderer.device(), renderer.format(), None, 1, false);

        self.gpu = Some(Gpu {
            window,
            renderer,
            egui_winit,
            egui_renderer,
        });
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let state = &mut self.state;

        let now_ms = state.started.elapsed().as_secs_f64() * 1000.0;
        let result = match state.stage.on_refresh(now_ms, &mut gpu.renderer) {
            Some(result) => result,
            None => gpu.renderer.render(&state.idle_scene, &state.idle_camera),
        };
        let frame = match result {
            Ok(frame) => frame,
            Err(e) if e.is_transient() => {
                tracing::debug!("skipped frame: {e}");
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let size = gpu.renderer.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        draw_egui(gpu, &frame, &full_output.textures_delta, &paint_jobs, &screen_descriptor);
        frame.present();

        if let Some(index) = state.switch_to.take() {
            state.mount(index);
            gpu.window.set_title(&state.title());
        }
        gpu.window.request_redraw();
    }
}

fn draw_egui(
    gpu: &mut Gpu,
    frame: &SurfaceFrame,
    textures_delta: &egui::TexturesDelta,
    paint_jobs: &[egui::ClippedPrimitive],
    screen_descriptor: &egui_wgpu::ScreenDescriptor,
) {
    let device = gpu.renderer.device();
    let queue = gpu.renderer.queue();
    for (id, image_delta) in &textures_delta.set {
        gpu.egui_renderer
            .update_texture(device, queue, *id, image_delta);
    }
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("egui_encoder"),
    });
    gpu.egui_renderer
        .update_buffers(device, queue, &mut encoder, paint_jobs, screen_descriptor);
    {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.view(),
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
            .render(&mut pass, paint_jobs, screen_descriptor);
    }
    queue.submit(std::iter::once(encoder.finish()));
    for id in &textures_delta.free {
        gpu.egui_renderer.free_texture(id);
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize GPU: {e}");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let consumed = gpu.egui_winit.on_window_event(&gpu.window, &event).consumed;

        match event {
            WindowEvent::CloseRequested => {
                self.state.stage.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.state
                    .stage
                    .on_resize(new_size.width, new_size.height, &mut gpu.renderer);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ if consumed => {}
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.state.handle_key(key),
            WindowEvent::CursorMoved { position, .. } => {
                self.forward_pointer(pointer::moved(position.x, position.y));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(event) = pointer::button(state, button) {
                    self.forward_pointer(event);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.forward_pointer(pointer::wheel(delta));
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

impl GpuApp {
    fn forward_pointer(&mut self, event: vitrine_input::PointerEvent) {
        if let Some(frame_loop) = self.state.stage.frame_loop_mut() {
            frame_loop.handle_pointer(event);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("vitrine-desktop starting");

    let viewport = Viewport::new(cli.width, cli.height);
    let mut state = AppState::new(cli.assets_dir, viewport);
    let Some(index) = state.demos.iter().position(|d| d.name() == cli.demo) else {
        bail!(
            "unknown demo {:?}; available: {}",
            cli.demo,
            vitrine_demos::names().join(", ")
        );
    };
    state.mount(index);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state, PhysicalSize::new(viewport.width, viewport.height));
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
