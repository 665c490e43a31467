use std::f32::consts::{FRAC_PI_2, TAU};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::camera::{Camera2D, MinimapMarker, MinimapView, Viewport, WorldBounds};
use super::deferred::DeferredQueue;
use super::entity::{EntityId, EntityRole, Ship, ShipCommand, ShipTuning, Thrust};
use super::generation::{generate_planets, GenerationConfig, GenerationError};
use super::input::{ControlSet, InputAction};
use super::interaction::{InteractionContext, InteractionOutcome, InteractionSystem};
use super::math::{Vec2, WorldRng};
use super::motion::CoastingMotion;
use super::registry::EntityManager;
use super::state::{GameState, GameStateMachine};
use super::ui::{AdvisoryChannel, AdvisoryDuration, AdvisoryKind, LeaveRequest, RenderSink, UiSink};

pub const MINIMAP_SIZE_PX: f32 = 180.0;
const MINIMAP_MIN_MARKER_RADIUS: f32 = 1.5;
const SCALE_NOTICE_DURATION: Duration = Duration::from_millis(1500);
const DRIFTER_MAX_SPEED: f32 = 90.0;
const DRIFTER_MAX_TURN: f32 = 0.15;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub speed_scale: f32,
    pub size_scale: f32,
    /// Non-player ships that coast on a fixed command.
    pub drifters: u32,
    pub generation: GenerationConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 4000.0,
            height: 4000.0,
            speed_scale: 1.0,
            size_scale: 1.0,
            drifters: 4,
            generation: GenerationConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidScale { name: &'static str, value: f32 },
}

fn validate_scale(name: &'static str, value: f32) -> Result<f32, WorldError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(WorldError::InvalidScale { name, value })
    }
}

/// The frame driver. Owns the registry, the state machine, the camera and
/// the pilot's controls, and runs them in a fixed order every frame.
#[derive(Debug)]
pub struct GameWorld {
    registry: EntityManager,
    state: GameStateMachine,
    interaction: InteractionSystem,
    deferred: DeferredQueue,
    advisories: AdvisoryChannel,
    controls: ControlSet,
    camera: Camera2D,
    viewport: Viewport,
    bounds: WorldBounds,
    speed_scale: f32,
    size_scale: f32,
    frame: u64,
}

impl GameWorld {
    pub fn new(bounds: WorldBounds, viewport: Viewport) -> Self {
        Self {
            registry: EntityManager::default(),
            state: GameStateMachine::default(),
            interaction: InteractionSystem::default(),
            deferred: DeferredQueue::default(),
            advisories: AdvisoryChannel::default(),
            controls: ControlSet::default(),
            camera: Camera2D::default(),
            viewport,
            bounds,
            speed_scale: 1.0,
            size_scale: 1.0,
            frame: 0,
        }
    }

    /// Builds a playable world: planets from the seeded generator and the
    /// player's ship at the centre, nose up.
    pub fn generate(config: &WorldConfig, viewport: Viewport) -> Result<Self, WorldError> {
        let speed_scale = validate_scale("speed_scale", config.speed_scale)?;
        let size_scale = validate_scale("size_scale", config.size_scale)?;
        let bounds = config.bounds();
        let start = bounds.center();

        let mut rng = WorldRng::seeded(config.generation.seed);
        let generated =
            generate_planets(&config.generation, bounds.width, bounds.height, start, &mut rng)?;

        let mut world = Self::new(bounds, viewport);
        world.speed_scale = speed_scale;
        world.size_scale = size_scale;
        for planet in generated.planets {
            world.registry.add_static(planet);
        }
        for _ in 0..config.drifters {
            world.spawn_drifter(&mut rng);
        }
        let ship = Ship::new(start, -FRAC_PI_2, ShipTuning::default())
            .with_scales(speed_scale, size_scale);
        world.registry.add_player(ship);
        world.update_camera();

        info!(
            width = bounds.width,
            height = bounds.height,
            planets = world.registry.statics().len(),
            drifters = config.drifters,
            speed_scale,
            size_scale,
            "world_generated"
        );
        Ok(world)
    }

    pub fn registry(&self) -> &EntityManager {
        &self.registry
    }

    /// Setup access for spawning and removing entities between frames.
    pub fn registry_mut(&mut self) -> &mut EntityManager {
        &mut self.registry
    }

    pub fn state(&self) -> GameState {
        self.state.current()
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn hovered_planet(&self) -> Option<EntityId> {
        self.interaction.hovered()
    }

    pub fn speed_scale(&self) -> f32 {
        self.speed_scale
    }

    pub fn size_scale(&self) -> f32 {
        self.size_scale
    }

    /// Input boundary: a key source reports a logical control going down or up.
    pub fn set_control(&mut self, action: InputAction, is_down: bool) {
        self.controls.set(action, is_down);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.update_camera();
    }

    /// One simulation frame: deferred actions, stepping per the state's
    /// policy, world-bounds clamp, interaction checks, camera.
    pub fn advance(&mut self, dt_seconds: f32, ui: &mut dyn UiSink) -> InteractionOutcome {
        let dt_seconds = if dt_seconds.is_finite() {
            dt_seconds.max(0.0)
        } else {
            0.0
        };
        self.frame = self.frame.saturating_add(1);

        for action in self.deferred.drain_due(self.frame) {
            self.interaction
                .run_deferred(action, &self.registry, &mut self.state, ui);
        }

        let policy = self.state.policy();
        if policy.step_world {
            self.registry
                .step(dt_seconds, &self.controls, policy.suspension());
            self.registry.confine(self.bounds);
        }

        let outcome = self.interaction.update(InteractionContext {
            frame: self.frame,
            registry: &self.registry,
            controls: &mut self.controls,
            state: &mut self.state,
            deferred: &mut self.deferred,
            advisories: &mut self.advisories,
            ui,
        });

        self.update_camera();
        outcome
    }

    /// Hands the current world to the presentation layer. Runs in every
    /// state so a modal view overlays a still-drawn world.
    pub fn present(&self, sink: &mut dyn RenderSink) {
        sink.begin_frame(&self.camera, self.viewport);
        self.registry.render(sink, &self.camera);
        sink.draw_minimap(&self.minimap(MINIMAP_SIZE_PX));
    }

    pub fn frame<P>(&mut self, dt_seconds: f32, presenter: &mut P) -> InteractionOutcome
    where
        P: UiSink + RenderSink,
    {
        let outcome = self.advance(dt_seconds, presenter);
        self.present(presenter);
        outcome
    }

    /// The modal view's leave callback.
    pub fn leave_planet(&mut self, request: LeaveRequest, ui: &mut dyn UiSink) -> bool {
        self.interaction.leave(
            request,
            InteractionContext {
                frame: self.frame,
                registry: &self.registry,
                controls: &mut self.controls,
                state: &mut self.state,
                deferred: &mut self.deferred,
                advisories: &mut self.advisories,
                ui,
            },
        )
    }

    /// Speed slider notification.
    pub fn set_speed_scale(&mut self, scale: f32, ui: &mut dyn UiSink) -> Result<(), WorldError> {
        let scale = validate_scale("speed_scale", scale)?;
        self.speed_scale = scale;
        self.registry.apply_speed_scale(scale);
        info!(speed_scale = scale, "speed_scale_changed");
        self.advisories.show(
            ui,
            AdvisoryKind::Notice,
            &format!("Speed x{scale:.1}"),
            AdvisoryDuration::Timed(SCALE_NOTICE_DURATION),
        );
        Ok(())
    }

    /// Size slider notification.
    pub fn set_size_scale(&mut self, scale: f32, ui: &mut dyn UiSink) -> Result<(), WorldError> {
        let scale = validate_scale("size_scale", scale)?;
        self.size_scale = scale;
        self.registry.apply_size_scale(scale);
        info!(size_scale = scale, "size_scale_changed");
        self.advisories.show(
            ui,
            AdvisoryKind::Notice,
            &format!("Size x{scale:.1}"),
            AdvisoryDuration::Timed(SCALE_NOTICE_DURATION),
        );
        Ok(())
    }

    pub fn minimap(&self, size_px: f32) -> MinimapView {
        let scale = (size_px / self.bounds.width).min(size_px / self.bounds.height);
        let planets = self
            .registry
            .statics()
            .iter()
            .map(|body| MinimapMarker {
                position: body.planet.position.scaled(scale),
                radius: (body.planet.radius * scale).max(MINIMAP_MIN_MARKER_RADIUS),
                color: body.planet.color,
            })
            .collect();
        let player = self
            .registry
            .player()
            .map(|movable| (movable.ship.position.scaled(scale), movable.ship.heading()));
        let view_size = Vec2::new(
            self.viewport.width as f32 * scale,
            self.viewport.height as f32 * scale,
        );

        MinimapView {
            size: Vec2::new(self.bounds.width * scale, self.bounds.height * scale),
            scale,
            planets,
            player,
            view_rect: (self.camera.position.scaled(scale), view_size),
        }
    }

    fn spawn_drifter(&mut self, rng: &mut WorldRng) {
        let tuning = ShipTuning {
            base_max_speed: DRIFTER_MAX_SPEED,
            ..ShipTuning::default()
        };
        let position = Vec2::new(
            rng.range_f32(0.0, self.bounds.width),
            rng.range_f32(0.0, self.bounds.height),
        );
        let heading = rng.range_f32(0.0, TAU);
        let command = ShipCommand {
            thrust: Thrust::Forward,
            turn: rng.range_f32(-DRIFTER_MAX_TURN, DRIFTER_MAX_TURN),
            boost: false,
        };
        let ship =
            Ship::new(position, heading, tuning).with_scales(self.speed_scale, self.size_scale);
        self.registry
            .add_movable(ship, EntityRole::Npc, Box::new(CoastingMotion { command }));
    }

    fn update_camera(&mut self) {
        let Some(player) = self.registry.player() else {
            debug!(frame = self.frame, "camera_without_player");
            return;
        };
        let target = player.ship.position;
        self.camera.follow(target, self.viewport, self.bounds);
    }
}
