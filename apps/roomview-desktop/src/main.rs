use anyhow::{Context, Result};
use clap::Parser;
use roomview_assets::FsSource;
use roomview_input::Action;
use roomview_render::RenderSurface;
use roomview_render_wgpu::WgpuRenderer;
use roomview_viewer::{SceneComposer, ViewerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Pixels of trackpad scroll counted as one wheel step.
const PIXELS_PER_WHEEL_STEP: f64 = 50.0;

#[derive(Parser)]
#[command(name = "roomview-desktop", about = "See-through room viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding `assets/`; overrides the config
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Draw the sun's shadow frustum
    #[arg(long)]
    shadow_helper: bool,

    /// Initial window width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height
    #[arg(long, default_value = "720")]
    height: u32,
}

/// The window's client area as the composer's render surface.
struct WindowSurface(Arc<Window>);

impl RenderSurface for WindowSurface {
    fn client_size(&self) -> (u32, u32) {
        let size = self.0.inner_size();
        (size.width, size.height)
    }
}

type Composer = SceneComposer<WgpuRenderer, WindowSurface>;

struct GpuApp {
    config: ViewerConfig,
    initial_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    composer: Option<Composer>,
    drag: Option<MouseButton>,
    cursor: Option<PhysicalPosition<f64>>,
    last_frame: Instant,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: ViewerConfig, initial_size: PhysicalSize<u32>) -> Self {
        Self {
            config,
            initial_size,
            window: None,
            composer: None,
            drag: None,
            cursor: None,
            last_frame: Instant::now(),
            fatal: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Room Viewer")
            .with_inner_size(self.initial_size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        let renderer = pollster::block_on(WgpuRenderer::new(
            Arc::clone(&window),
            size.width,
            size.height,
        ))?;

        let source = Arc::new(FsSource::new(&self.config.asset_root));
        let composer = SceneComposer::initialize(
            renderer,
            WindowSurface(Arc::clone(&window)),
            source,
            &self.config,
        )?;

        self.window = Some(window);
        self.composer = Some(composer);
        Ok(())
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>) {
        let previous = self.cursor.replace(position);
        let (Some(last), Some(button), Some(composer)) =
            (previous, self.drag, self.composer.as_mut())
        else {
            return;
        };
        let (dx, dy) = (position.x - last.x, position.y - last.y);
        let (_, height) = composer.surface().client_size();
        let action = match button {
            MouseButton::Left => Action::orbit_pixels(dx, dy, height),
            MouseButton::Right | MouseButton::Middle => Action::pan_pixels(dx, dy, height),
            _ => return,
        };
        composer.handle_action(action);
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            tracing::error!("startup failed: {e:#}");
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
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                if let Some(composer) = &mut self.composer {
                    if let Err(e) = composer.resize() {
                        tracing::error!("render after resize failed: {e}");
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match state {
                    ElementState::Pressed => Some(button),
                    ElementState::Released => None,
                };
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_WHEEL_STEP) as f32,
                };
                if let Some(composer) = &mut self.composer {
                    composer.handle_action(Action::Dolly(steps));
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32().min(0.1);
                self.last_frame = now;

                if let Some(composer) = &mut self.composer {
                    if let Err(e) = composer.advance(dt) {
                        tracing::error!("frame failed: {e}");
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
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
        Some(path) => ViewerConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(assets) = cli.assets {
        config.asset_root = assets;
    }
    config.shadow_helper |= cli.shadow_helper;

    tracing::info!(asset_root = %config.asset_root.display(), "roomview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config, PhysicalSize::new(cli.width, cli.height));
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
