//! Core of a top-down space exploration game: ships fly between procedurally
//! placed planets and land on them. The simulation is frontend-agnostic; it
//! talks to presentation only through [`RenderSink`] and [`UiSink`].

pub mod app;

pub use app::{
    run_app, AdvisoryDuration, AppError, Camera2D, CoastingMotion, ControlSet, EntityId,
    EntityManager, EntityRole, GameState, GameStateMachine, GameWorld, GenerationConfig,
    GenerationError, InputAction, InteractionOutcome, LeaveRequest, LoopConfig, MinimapView,
    MotionModel, PilotedMotion, Planet, PlanetInfo, RenderSink, Renderer, Ship, ShipTuning,
    StateError, UiSink, Vec2, Viewport, WorldBounds, WorldConfig, WorldError,
};
