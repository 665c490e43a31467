use std::time::Duration;

use tracing::{debug, info, warn};

use super::deferred::{DeferredAction, DeferredQueue};
use super::entity::{EntityId, Ship};
use super::input::{ControlSet, InputAction};
use super::math::circles_overlap;
use super::registry::{EntityManager, StaticEntity};
use super::state::{GameState, GameStateMachine};
use super::ui::{AdvisoryChannel, AdvisoryDuration, AdvisoryKind, LeaveRequest, PlanetInfo, UiSink};

/// A ship may land only below this fraction of its max speed.
pub const LANDING_SPEED_FRACTION: f32 = 0.5;
pub const DEPARTURE_ADVISORY_DURATION: Duration = Duration::from_secs(2);
pub const DEFAULT_DEBOUNCE_FRAMES: u64 = 1;
/// Slack added to the ship radius for hover checks. Collision push-out
/// converges onto the rim, where the plain overlap test no longer fires.
pub const HOVER_MARGIN: f32 = 1.0;

pub fn landing_eligible(speed: f32, max_speed: f32) -> bool {
    speed.abs() < LANDING_SPEED_FRACTION * max_speed
}

/// First planet in insertion order that overlaps the ship, give or take
/// [`HOVER_MARGIN`]. Not the nearest.
pub fn find_hover_target<'a>(statics: &'a [StaticEntity], ship: &Ship) -> Option<&'a StaticEntity> {
    statics.iter().find(|body| {
        circles_overlap(
            ship.position,
            ship.radius() + HOVER_MARGIN,
            body.planet.position,
            body.planet.radius,
        )
    })
}

pub fn landing_ready_text(planet_name: &str) -> String {
    format!("Press E to land on {planet_name}")
}

pub fn landing_too_fast_text(planet_name: &str) -> String {
    format!("Slow down to land on {planet_name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The active state does not run interaction checks.
    Inert,
    NoPlayer,
    Clear,
    Hovering { planet: EntityId, eligible: bool },
    LandingRequested { planet: EntityId },
}

/// Borrowed view of everything one interaction pass may read or touch.
pub struct InteractionContext<'a> {
    pub frame: u64,
    pub registry: &'a EntityManager,
    pub controls: &'a mut ControlSet,
    pub state: &'a mut GameStateMachine,
    pub deferred: &'a mut DeferredQueue,
    pub(crate) advisories: &'a mut AdvisoryChannel,
    pub ui: &'a mut dyn UiSink,
}

/// Decides each frame what the player can do. Reads entities, never moves
/// them; its only writes go to the state machine, the control set and the
/// UI.
#[derive(Debug)]
pub struct InteractionSystem {
    hovered: Option<EntityId>,
    debounce_frames: u64,
}

impl Default for InteractionSystem {
    fn default() -> Self {
        Self {
            hovered: None,
            debounce_frames: DEFAULT_DEBOUNCE_FRAMES,
        }
    }
}

impl InteractionSystem {
    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    pub fn update(&mut self, ctx: InteractionContext<'_>) -> InteractionOutcome {
        if !ctx.state.policy().interaction_checks {
            self.hovered = None;
            return InteractionOutcome::Inert;
        }
        let Some(player) = ctx.registry.player() else {
            self.hovered = None;
            return InteractionOutcome::NoPlayer;
        };

        let Some(target) = find_hover_target(ctx.registry.statics(), &player.ship) else {
            if self.hovered.take().is_some() {
                debug!(frame = ctx.frame, "hover_lost");
            }
            ctx.advisories.clear_landing(ctx.ui);
            return InteractionOutcome::Clear;
        };

        if self.hovered != Some(target.id) {
            debug!(planet = %target.planet.name, frame = ctx.frame, "hover_started");
        }
        self.hovered = Some(target.id);

        let eligible = landing_eligible(player.ship.speed(), player.ship.max_speed());
        if eligible {
            ctx.advisories.show(
                ctx.ui,
                AdvisoryKind::LandingReady,
                &landing_ready_text(&target.planet.name),
                AdvisoryDuration::Persistent,
            );
        } else {
            ctx.advisories.show(
                ctx.ui,
                AdvisoryKind::LandingTooFast,
                &landing_too_fast_text(&target.planet.name),
                AdvisoryDuration::Persistent,
            );
        }

        if !eligible || !ctx.controls.is_down(InputAction::Interact) {
            return InteractionOutcome::Hovering {
                planet: target.id,
                eligible,
            };
        }

        ctx.state.set_state(GameState::PlanetView);
        ctx.controls.clear(InputAction::Interact);
        ctx.advisories.clear_landing(ctx.ui);
        ctx.deferred.schedule(
            ctx.frame,
            self.debounce_frames,
            DeferredAction::ShowPlanetInfo { planet: target.id },
        );
        self.hovered = None;
        info!(
            planet = %target.planet.name,
            speed = player.ship.speed(),
            frame = ctx.frame,
            "landing_requested"
        );
        InteractionOutcome::LandingRequested { planet: target.id }
    }

    /// Runs a drained deferred action. Targets are looked up again by id; if
    /// anything vanished in between, the landing is abandoned.
    pub fn run_deferred(
        &mut self,
        action: DeferredAction,
        registry: &EntityManager,
        state: &mut GameStateMachine,
        ui: &mut dyn UiSink,
    ) {
        match action {
            DeferredAction::ShowPlanetInfo { planet } => {
                if !state.is(GameState::PlanetView) {
                    debug!(planet = planet.0, state = %state.current(), "planet_info_skipped");
                    return;
                }
                let Some(body) = registry.find_static(planet) else {
                    warn!(planet = planet.0, "planet_info_target_missing");
                    state.set_state(GameState::Flying);
                    return;
                };
                if registry.player().is_none() {
                    warn!(planet = %body.planet.name, "planet_info_player_missing");
                    state.set_state(GameState::Flying);
                    return;
                }
                let info = PlanetInfo::from_planet(body.id, &body.planet);
                info!(planet = %info.name, "planet_info_shown");
                ui.show_modal_info(&info, LeaveRequest::new(planet));
            }
        }
    }

    /// Handles the modal view's leave request. Returns whether the state
    /// actually went back to flying.
    pub fn leave(&mut self, request: LeaveRequest, ctx: InteractionContext<'_>) -> bool {
        // A key-up may have been swallowed while the modal had focus.
        ctx.controls.clear(InputAction::Interact);

        if !ctx.state.is(GameState::PlanetView) {
            debug!(planet = request.planet().0, state = %ctx.state.current(), "leave_ignored");
            return false;
        }

        ctx.state.set_state(GameState::Flying);
        ctx.ui.hide_modal_info();
        let name = ctx
            .registry
            .find_static(request.planet())
            .map(|body| body.planet.name.as_str())
            .unwrap_or("orbit");
        ctx.advisories.show(
            ctx.ui,
            AdvisoryKind::Departure,
            &format!("Departing {name}"),
            AdvisoryDuration::Timed(DEPARTURE_ADVISORY_DURATION),
        );
        info!(planet = name, frame = ctx.frame, "planet_left");
        true
    }
}
