mod camera;
mod deferred;
mod entity;
mod generation;
mod input;
mod interaction;
mod loop_runner;
mod math;
mod metrics;
mod motion;
mod registry;
mod rendering;
mod state;
mod ui;
mod world;

pub use camera::{Camera2D, MinimapMarker, MinimapView, Viewport, WorldBounds};
pub use deferred::{DeferredAction, DeferredQueue};
pub use entity::{
    EntityId, EntityIdAllocator, EntityRole, Planet, Ship, ShipCommand, ShipTuning, Thrust,
};
pub use generation::{
    generate_planets, GeneratedPlanets, GenerationConfig, GenerationError, MAX_PLANET_COUNT,
};
pub use input::{ControlSet, InputAction};
pub use interaction::{
    find_hover_target, landing_eligible, landing_ready_text, landing_too_fast_text,
    InteractionOutcome, InteractionSystem, DEFAULT_DEBOUNCE_FRAMES, HOVER_MARGIN,
    LANDING_SPEED_FRACTION,
};
pub use loop_runner::{run_app, AppError, LoopConfig, MAX_SCALE, MIN_SCALE, SCALE_STEP};
pub use math::{circles_overlap, distance, Vec2, WorldRng};
pub use metrics::LoopMetricsSnapshot;
pub use motion::{CoastingMotion, MotionModel, PilotedMotion, TickContext};
pub use registry::{resolve_overlap, EntityManager, Movable, StaticEntity, Suspension};
pub use rendering::{circle_on_screen, world_to_screen_px, Renderer};
pub use state::{GameState, GameStateMachine, StateError, StatePolicy};
pub use ui::{AdvisoryDuration, LeaveRequest, PlanetInfo, RenderSink, UiSink};
pub use world::{GameWorld, WorldConfig, WorldError, MINIMAP_SIZE_PX};
