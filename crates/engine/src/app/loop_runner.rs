use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::{ControlSet, InputAction};
use super::metrics::MetricsAccumulator;
use super::rendering::Renderer;
use super::ui::{LeaveRequest, UiSink};
use super::world::{GameWorld, WorldConfig, WorldError};

pub const SCALE_STEP: f32 = 0.25;
pub const MIN_SCALE: f32 = 0.25;
pub const MAX_SCALE: f32 = 4.0;

const HELD_ACTIONS: [InputAction; 5] = [
    InputAction::Forward,
    InputAction::Reverse,
    InputAction::RotateLeft,
    InputAction::RotateRight,
    InputAction::Boost,
];

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Planetfall".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(5),
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to build world: {0}")]
    World(#[from] WorldError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window, generates the world and drives it until the window
/// closes. The simulation runs on a fixed tick; rendering happens once per
/// redraw.
pub fn run_app(config: LoopConfig, world_config: &WorldConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), config.window_title.clone())
        .map_err(AppError::CreateRenderer)?;
    let mut world = GameWorld::generate(world_config, renderer.viewport())?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        non_zero_or(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval = non_zero_or(config.metrics_log_interval, Duration::from_secs(5));
    let render_fps_cap = config.max_render_fps.filter(|fps| *fps > 0);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = render_fps_cap.unwrap_or(0),
        "loop_config"
    );

    let mut input = InputCollector::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics = MetricsAccumulator::new(metrics_log_interval, Instant::now());

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    world.set_viewport(renderer.viewport());
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    world.set_viewport(renderer.viewport());
                }
                WindowEvent::Focused(false) => input.release_all(),
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_key(event.physical_key, event.state, event.repeat);
                    if input.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let frame_input = input.take_frame_input();
                    let open_modal = renderer.active_leave_request();
                    apply_frame_input(&mut world, &mut renderer, open_modal, &frame_input);

                    accumulator =
                        accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
                    let plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..plan.ticks_to_run {
                        world.advance(fixed_dt_seconds, &mut renderer);
                    }
                    metrics.record_ticks(plan.ticks_to_run);
                    accumulator = plan.remaining_accumulator;
                    if plan.dropped_backlog > Duration::ZERO {
                        metrics.record_dropped(plan.dropped_backlog);
                        warn!(
                            dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let cap_sleep = render_cap_sleep(
                        Instant::now().saturating_duration_since(last_present_instant),
                        render_fps_cap,
                    );
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    world.present(&mut renderer);
                    if let Err(error) = renderer.finish_frame(Instant::now()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();
                    metrics.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            dropped_ms = snapshot.dropped_ms,
                            state = %world.state(),
                            movables = world.registry().movables().len(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => info!(frames = world.frame_index(), "shutdown"),
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Input gathered between two redraws.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FrameInput {
    held: ControlSet,
    interact_pressed: bool,
    interact_released: bool,
    speed_steps: i32,
    size_steps: i32,
}

/// Turns raw key events into held controls and per-frame edges. Interact is
/// edge-driven only, so the world's forced clear is never undone by a key
/// that is still held.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    held: ControlSet,
    interact_is_down: bool,
    interact_pressed_edge: bool,
    interact_released_edge: bool,
    speed_steps: i32,
    size_steps: i32,
}

impl InputCollector {
    fn handle_key(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) {
        let is_pressed = state == ElementState::Pressed;
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => self.held.set(InputAction::Forward, is_pressed),
            KeyCode::KeyS | KeyCode::ArrowDown => self.held.set(InputAction::Reverse, is_pressed),
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.held.set(InputAction::RotateLeft, is_pressed)
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.held.set(InputAction::RotateRight, is_pressed)
            }
            KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                self.held.set(InputAction::Boost, is_pressed)
            }
            KeyCode::KeyE => self.handle_interact(is_pressed, repeat),
            KeyCode::Equal | KeyCode::NumpadAdd if is_pressed => {
                self.speed_steps = self.speed_steps.saturating_add(1)
            }
            KeyCode::Minus | KeyCode::NumpadSubtract if is_pressed => {
                self.speed_steps = self.speed_steps.saturating_sub(1)
            }
            KeyCode::BracketRight if is_pressed => {
                self.size_steps = self.size_steps.saturating_add(1)
            }
            KeyCode::BracketLeft if is_pressed => {
                self.size_steps = self.size_steps.saturating_sub(1)
            }
            KeyCode::Escape if is_pressed => self.quit_requested = true,
            _ => {}
        }
    }

    fn handle_interact(&mut self, is_pressed: bool, repeat: bool) {
        if is_pressed {
            if !self.interact_is_down && !repeat {
                self.interact_pressed_edge = true;
                // A press supersedes any release seen earlier in the frame.
                self.interact_released_edge = false;
            }
            self.interact_is_down = true;
        } else {
            if self.interact_is_down {
                self.interact_released_edge = true;
            }
            self.interact_is_down = false;
        }
    }

    fn release_all(&mut self) {
        self.held.release_all();
        if self.interact_is_down {
            self.interact_released_edge = true;
        }
        self.interact_is_down = false;
    }

    /// A press and release inside one frame reports the press now and keeps
    /// the release for the next frame, so the world sees interact held for
    /// at least one frame.
    fn take_frame_input(&mut self) -> FrameInput {
        let interact_pressed = std::mem::take(&mut self.interact_pressed_edge);
        let interact_released = !interact_pressed && std::mem::take(&mut self.interact_released_edge);
        FrameInput {
            held: self.held,
            interact_pressed,
            interact_released,
            speed_steps: std::mem::take(&mut self.speed_steps),
            size_steps: std::mem::take(&mut self.size_steps),
        }
    }
}

fn apply_frame_input(
    world: &mut GameWorld,
    ui: &mut dyn UiSink,
    open_modal: Option<LeaveRequest>,
    input: &FrameInput,
) {
    for action in HELD_ACTIONS {
        world.set_control(action, input.held.is_down(action));
    }

    if input.interact_pressed {
        match open_modal {
            Some(request) => {
                world.leave_planet(request, ui);
            }
            None => world.set_control(InputAction::Interact, true),
        }
    } else if input.interact_released {
        world.set_control(InputAction::Interact, false);
    }

    if input.speed_steps != 0 {
        let next = stepped_scale(world.speed_scale(), input.speed_steps);
        if next != world.speed_scale() {
            if let Err(error) = world.set_speed_scale(next, ui) {
                warn!(error = %error, "speed_scale_rejected");
            }
        }
    }
    if input.size_steps != 0 {
        let next = stepped_scale(world.size_scale(), input.size_steps);
        if next != world.size_scale() {
            if let Err(error) = world.set_size_scale(next, ui) {
                warn!(error = %error, "size_scale_rejected");
            }
        }
    }
}

fn stepped_scale(current: f32, steps: i32) -> f32 {
    (current + steps as f32 * SCALE_STEP).clamp(MIN_SCALE, MAX_SCALE)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(mut accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }
    // Whole ticks left over after the cap are dropped rather than carried.
    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn render_cap_sleep(elapsed: Duration, max_render_fps: Option<u32>) -> Duration {
    let Some(fps) = max_render_fps.filter(|fps| *fps > 0) else {
        return Duration::ZERO;
    };
    Duration::from_secs_f64(1.0 / fps as f64).saturating_sub(elapsed)
}
