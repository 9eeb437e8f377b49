use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::{StartupError, Vec2};

use super::frame_driver::{FrameDriver, DEFAULT_MAX_FRAME_DELTA};
use super::input::PendingInput;
use super::metrics::MetricsAccumulator;
use super::scene::SceneRuntime;
use super::{
    Camera2D, Canvas, MetricsHandle, RenderContext, RenderContextError, Renderer, Rgba, Scene,
    SceneCommand,
};

pub const SLOW_FRAME_ENV_VAR: &str = "CASTAWAY_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Pixels per world unit at zoom 1.
    pub tile_size: f32,
    pub max_frame_delta: Duration,
    pub max_render_fps: Option<u32>,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub clear_color: Rgba,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Castaway".to_string(),
            window_width: 1280,
            window_height: 720,
            tile_size: 128.0,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            max_render_fps: None,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            clear_color: [20, 52, 96, 255],
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("event loop unavailable: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("window could not be opened: {0}")]
    CreateWindow(#[source] OsError),
    #[error("pixel buffer setup failed: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error(transparent)]
    RenderContext(#[from] RenderContextError),
    #[error("event loop stopped with an error: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    run_app_with_metrics(config, scene, MetricsHandle::default())
}

/// Opens the window and drives `scene` until it quits or the window closes. Each frame
/// runs `update`, `begin_frame`, `render`, `end_frame`, then presents the canvas.
pub fn run_app_with_metrics(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    metrics: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window_width),
                f64::from(config.window_height),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    let viewport = renderer.viewport();
    let canvas = Canvas::new(viewport.width.max(1), viewport.height.max(1));
    let mut ctx = RenderContext::new(Box::new(canvas), Camera2D::default(), config.tile_size)?
        .with_clear_color(config.clear_color);
    let mut input = PendingInput::new(viewport.width, viewport.height);

    let max_frame_delta = non_zero_or(config.max_frame_delta, DEFAULT_MAX_FRAME_DELTA);
    let report_every = non_zero_or(config.metrics_log_interval, Duration::from_secs(1));
    let mut pacing = FramePacing::new(
        slow_frame_delay(env::var(SLOW_FRAME_ENV_VAR), config.simulated_slow_frame_ms),
        config.max_render_fps,
    );

    let mut scene = SceneRuntime::new(scene);
    scene.load(&mut ctx);
    info!(entity_count = scene.entity_count(), "scene_loaded");
    info!(
        width = viewport.width,
        height = viewport.height,
        tile_size = config.tile_size,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = report_every.as_millis() as u64,
        slow_frame_delay_ms = pacing.slow_frame.as_millis() as u64,
        render_fps_cap = %pacing.cap_label(),
        "loop_config"
    );

    event_loop.set_control_flow(ControlFlow::Poll);
    let started = Instant::now();
    let mut driver = FrameDriver::new(max_frame_delta);
    driver.start(started);
    let mut previous_frame = started;
    let mut accumulator = MetricsAccumulator::new(report_every, started);
    let mut shown_title: Option<String> = None;

    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input.request_quit();
                    info!(reason = "window_close", "shutdown_requested");
                    target.exit();
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input.resize(size.width, size.height);
                    ctx.resize(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.cursor(Some(Vec2::new(position.x as f32, position.y as f32)));
                }
                WindowEvent::CursorLeft { .. } => input.cursor(None),
                WindowEvent::MouseInput { state, button, .. } => input.button(button, state),
                WindowEvent::MouseWheel { delta, .. } => input.scroll(delta),
                WindowEvent::KeyboardInput { event, .. } => {
                    input.key(event.physical_key, event.state);
                    if input.wants_quit() {
                        info!(reason = "escape_key", "shutdown_requested");
                        target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    pacing.wait();

                    let now = Instant::now();
                    let wall_dt = now.saturating_duration_since(previous_frame);
                    previous_frame = now;

                    let frame_input = input.take_frame();
                    let mut command = SceneCommand::None;
                    if !driver.frame(now, |dt| {
                        command = scene.run_frame(dt, &frame_input, &mut ctx);
                    }) {
                        return;
                    }

                    if let Some(pixels) = ctx.surface().rgba_frame() {
                        if let Err(error) = renderer.present(pixels) {
                            warn!(error = %error, "renderer_present_failed");
                            target.exit();
                        }
                    }
                    pacing.presented(Instant::now());

                    let title = scene.debug_title();
                    if title != shown_title {
                        window.set_title(title.as_deref().unwrap_or(&config.window_title));
                        shown_title = title;
                    }

                    accumulator.record_frame(wall_dt, scene.entity_count());
                    if let Some(snapshot) = accumulator.maybe_snapshot(now) {
                        metrics.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            slowest_frame_ms = snapshot.slowest_frame_ms,
                            entity_count = snapshot.entity_count,
                            "loop_metrics"
                        );
                    }

                    if command == SceneCommand::Quit {
                        info!(reason = "scene_quit", "shutdown_requested");
                        target.exit();
                    }
                }
                _ => {}
            },
            Event::Suspended => {
                driver.stop();
                info!("loop_suspended");
            }
            Event::Resumed => {
                let now = Instant::now();
                if driver.start(now) {
                    previous_frame = now;
                    info!("loop_resumed");
                }
            }
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                driver.stop();
                scene.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Sleeps applied before each redraw: the debug slow-frame delay, then whatever is left of
/// the render cap budget since the last present.
#[derive(Debug, Clone, Copy)]
struct FramePacing {
    slow_frame: Duration,
    budget: Option<Duration>,
    last_present: Option<Instant>,
}

impl FramePacing {
    fn new(slow_frame: Duration, max_render_fps: Option<u32>) -> Self {
        Self {
            slow_frame,
            budget: max_render_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            last_present: None,
        }
    }

    fn cap_label(&self) -> String {
        match self.budget {
            Some(budget) => format!("{:.0}", 1.0 / budget.as_secs_f64()),
            None => "off".to_string(),
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        match (self.budget, self.last_present) {
            (Some(budget), Some(last)) => budget.saturating_sub(now.saturating_duration_since(last)),
            _ => Duration::ZERO,
        }
    }

    fn wait(&self) {
        if !self.slow_frame.is_zero() {
            thread::sleep(self.slow_frame);
        }
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
    }

    fn presented(&mut self, at: Instant) {
        self.last_present = Some(at);
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// The env var wins over the configured delay when it holds a millisecond count.
fn slow_frame_delay(var: Result<String, env::VarError>, configured_ms: u64) -> Duration {
    let configured = Duration::from_millis(configured_ms);
    let raw = match var {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return configured,
        Err(error) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %error, "slow_frame_env_unreadable");
            return configured;
        }
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, value = raw.as_str(), "slow_frame_env_invalid");
            configured
        }
    }
}
