use std::fmt;

use tracing::{debug, warn};

use super::camera::{Camera2D, WorldBounds};
use super::entity::{EntityId, EntityIdAllocator, EntityRole, Planet, Ship};
use super::input::ControlSet;
use super::math::{distance, Vec2};
use super::motion::{CoastingMotion, MotionModel, PilotedMotion, TickContext};
use super::ui::RenderSink;

/// Fraction of the overlap removed per step. Full correction makes ships
/// jitter against planet rims.
pub const COLLISION_DAMPING: f32 = 0.5;

const COINCIDENT_EPSILON: f32 = 1.0e-4;

pub struct Movable {
    pub id: EntityId,
    pub role: EntityRole,
    pub ship: Ship,
    motion: Box<dyn MotionModel>,
}

impl Movable {
    pub fn motion_name(&self) -> &'static str {
        self.motion.name()
    }
}

impl fmt::Debug for Movable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Movable")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("ship", &self.ship)
            .field("motion", &self.motion.name())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticEntity {
    pub id: EntityId,
    pub planet: Planet,
}

/// Which movables sit out a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Suspension {
    pub player: bool,
}

/// Owns every ship and planet and is the only thing that moves them.
#[derive(Debug, Default)]
pub struct EntityManager {
    allocator: EntityIdAllocator,
    movables: Vec<Movable>,
    statics: Vec<StaticEntity>,
    player: Option<EntityId>,
}

impl EntityManager {
    pub fn add_movable(
        &mut self,
        ship: Ship,
        role: EntityRole,
        motion: Box<dyn MotionModel>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        if role == EntityRole::Player {
            if let Some(previous) = self.player.replace(id) {
                warn!(
                    previous = previous.0,
                    next = id.0,
                    "player_redesignated"
                );
                if let Some(old) = self.find_movable_mut(previous) {
                    old.role = EntityRole::Npc;
                    old.motion = Box::new(CoastingMotion::default());
                }
            }
        }
        debug!(id = id.0, ?role, motion = motion.name(), "movable_added");
        self.movables.push(Movable {
            id,
            role,
            ship,
            motion,
        });
        id
    }

    pub fn add_player(&mut self, ship: Ship) -> EntityId {
        self.add_movable(ship, EntityRole::Player, Box::new(PilotedMotion))
    }

    pub fn add_static(&mut self, planet: Planet) -> EntityId {
        let id = self.allocator.allocate();
        self.statics.push(StaticEntity { id, planet });
        id
    }

    pub fn remove_movable(&mut self, id: EntityId) -> bool {
        let before = self.movables.len();
        self.movables.retain(|movable| movable.id != id);
        let removed = self.movables.len() != before;
        if removed && self.player == Some(id) {
            self.player = None;
            debug!(id = id.0, "player_removed");
        }
        removed
    }

    pub fn movables(&self) -> &[Movable] {
        &self.movables
    }

    pub fn statics(&self) -> &[StaticEntity] {
        &self.statics
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn player(&self) -> Option<&Movable> {
        self.player.and_then(|id| self.find_movable(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Movable> {
        let id = self.player?;
        self.find_movable_mut(id)
    }

    pub fn find_movable(&self, id: EntityId) -> Option<&Movable> {
        self.movables.iter().find(|movable| movable.id == id)
    }

    pub fn find_movable_mut(&mut self, id: EntityId) -> Option<&mut Movable> {
        self.movables.iter_mut().find(|movable| movable.id == id)
    }

    pub fn find_static(&self, id: EntityId) -> Option<&StaticEntity> {
        self.statics.iter().find(|entity| entity.id == id)
    }

    /// Moves every non-suspended movable, then pushes each one out of any
    /// planet it overlaps.
    pub fn step(&mut self, dt_seconds: f32, controls: &ControlSet, suspension: Suspension) {
        let context = TickContext {
            dt_seconds,
            controls,
        };
        let player = self.player;
        let statics = &self.statics;

        for movable in &mut self.movables {
            if suspension.player && Some(movable.id) == player {
                continue;
            }
            movable.motion.advance(&mut movable.ship, &context);
            for body in statics {
                if let Some(corrected) = resolve_overlap(&movable.ship, &body.planet) {
                    movable.ship.position = corrected;
                }
            }
        }
    }

    pub fn confine(&mut self, bounds: WorldBounds) {
        for movable in &mut self.movables {
            movable.ship.position = bounds.confine(movable.ship.position, movable.ship.radius());
        }
    }

    /// Planets go down first so ships draw over them.
    pub fn render(&self, sink: &mut dyn RenderSink, camera: &Camera2D) {
        for body in &self.statics {
            sink.draw_planet(&body.planet, camera);
        }
        for movable in &self.movables {
            sink.draw_ship(&movable.ship, movable.role, camera);
        }
    }

    pub fn apply_speed_scale(&mut self, speed_scale: f32) {
        for movable in &mut self.movables {
            movable.ship.set_speed_scale(speed_scale);
        }
    }

    pub fn apply_size_scale(&mut self, size_scale: f32) {
        for movable in &mut self.movables {
            movable.ship.set_size_scale(size_scale);
        }
    }
}

/// Position correction for a ship overlapping a planet, or `None` when they
/// are apart. The ship is moved straight away from the planet centre.
pub fn resolve_overlap(ship: &Ship, planet: &Planet) -> Option<Vec2> {
    let radius_sum = ship.radius() + planet.radius;
    let separation = distance(ship.position, planet.position);
    if separation >= radius_sum {
        return None;
    }

    let overlap = radius_sum - separation;
    let direction = if separation > COINCIDENT_EPSILON {
        ship.position.minus(planet.position).scaled(separation.recip())
    } else {
        Vec2::from_heading(ship.heading()).scaled(-1.0)
    };
    Some(
        ship.position
            .offset(direction.scaled(overlap * COLLISION_DAMPING)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::entity::{ShipCommand, ShipTuning, Thrust};
    use crate::app::input::InputAction;
    use crate::app::ui::recording::{DrawCall, RecordingPresenter};

    fn planet(name: &str, x: f32, y: f32, radius: f32) -> Planet {
        Planet {
            position: Vec2::new(x, y),
            radius,
            color: [120, 160, 220, 255],
            name: name.to_string(),
            description: String::new(),
            features: Vec::new(),
        }
    }

    fn ship_at(x: f32, y: f32) -> Ship {
        Ship::new(Vec2::new(x, y), 0.0, ShipTuning::default())
    }

    fn coasting(thrust: Thrust) -> Box<dyn MotionModel> {
        Box::new(CoastingMotion {
            command: ShipCommand {
                thrust,
                ..ShipCommand::default()
            },
        })
    }

    #[test]
    fn player_is_resolved_by_role_not_insertion_order() {
        let mut registry = EntityManager::default();
        let npc = registry.add_movable(ship_at(0.0, 0.0), EntityRole::Npc, coasting(Thrust::Idle));
        let player = registry.add_player(ship_at(5.0, 5.0));

        assert_ne!(npc, player);
        assert_eq!(registry.player_id(), Some(player));
        assert_eq!(registry.player().map(|movable| movable.id), Some(player));
        assert_eq!(registry.movables()[0].id, npc);
    }

    #[test]
    fn second_player_registration_demotes_the_first() {
        let mut registry = EntityManager::default();
        let first = registry.add_player(ship_at(0.0, 0.0));
        let second = registry.add_player(ship_at(1.0, 0.0));

        assert_eq!(registry.player_id(), Some(second));
        let demoted = registry.find_movable(first).expect("demoted");
        assert_eq!(demoted.role, EntityRole::Npc);
        assert_eq!(demoted.motion_name(), "coasting");

        let controls = ControlSet::default().with_action_down(InputAction::Forward);
        for _ in 0..30 {
            registry.step(1.0 / 60.0, &controls, Suspension::default());
        }
        assert_eq!(
            registry.find_movable(first).expect("demoted").ship.position,
            Vec2::new(0.0, 0.0)
        );
        assert!(registry.player().expect("player").ship.position != Vec2::new(1.0, 0.0));
    }

    #[test]
    fn removing_player_clears_designation() {
        let mut registry = EntityManager::default();
        let player = registry.add_player(ship_at(0.0, 0.0));
        assert!(registry.remove_movable(player));
        assert!(registry.player().is_none());
        assert!(!registry.remove_movable(player));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut registry = EntityManager::default();
        registry.add_static(planet("a", 0.0, 0.0, 10.0));
        registry.add_static(planet("b", 100.0, 0.0, 10.0));
        registry.add_static(planet("c", 200.0, 0.0, 10.0));
        let names: Vec<&str> = registry
            .statics()
            .iter()
            .map(|body| body.planet.name.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn step_keeps_speed_within_max() {
        let mut registry = EntityManager::default();
        registry.add_player(ship_at(500.0, 500.0));
        registry.add_movable(
            ship_at(900.0, 500.0),
            EntityRole::Npc,
            coasting(Thrust::Reverse),
        );
        let controls = ControlSet::default()
            .with_action_down(InputAction::Forward)
            .with_action_down(InputAction::Boost);

        for _ in 0..300 {
            registry.step(1.0 / 60.0, &controls, Suspension::default());
            for movable in registry.movables() {
                assert!(movable.ship.speed().abs() <= movable.ship.max_speed());
            }
        }
    }

    #[test]
    fn collision_pushes_ship_away_without_touching_speed() {
        let mut registry = EntityManager::default();
        registry.add_static(planet("rock", 100.0, 100.0, 50.0));
        let player = registry.add_player(ship_at(140.0, 100.0));
        registry
            .find_movable_mut(player)
            .expect("player")
            .ship
            .set_speed(0.0);

        let before = distance(Vec2::new(140.0, 100.0), Vec2::new(100.0, 100.0));
        registry.step(1.0 / 60.0, &ControlSet::default(), Suspension::default());

        let ship = &registry.player().expect("player").ship;
        let after = distance(ship.position, Vec2::new(100.0, 100.0));
        assert!(after > before);
        assert_eq!(ship.speed(), 0.0);
        // Half the overlap is removed: 40 -> 40 + (64 - 40) * 0.5.
        assert!((after - 52.0).abs() < 0.001);
        assert!((ship.position.y - 100.0).abs() < 0.001);
    }

    #[test]
    fn collision_separation_is_monotonic_for_every_pair() {
        let planets = [
            planet("a", 0.0, 0.0, 30.0),
            planet("b", 50.0, 10.0, 25.0),
        ];
        let candidates = [
            ship_at(5.0, 0.0),
            ship_at(30.0, 5.0),
            ship_at(0.0, 0.0),
            ship_at(200.0, 200.0),
        ];
        for ship in candidates {
            for body in &planets {
                let radius_sum = ship.radius() + body.radius;
                let before = distance(ship.position, body.position);
                match resolve_overlap(&ship, body) {
                    None => assert!(before >= radius_sum),
                    Some(corrected) => {
                        let after = distance(corrected, body.position);
                        assert!(after >= radius_sum || after > before);
                    }
                }
            }
        }
    }

    #[test]
    fn suspended_player_is_frozen_while_others_move() {
        let mut registry = EntityManager::default();
        let player = registry.add_player(ship_at(100.0, 100.0));
        let npc = registry.add_movable(
            ship_at(300.0, 100.0),
            EntityRole::Npc,
            coasting(Thrust::Forward),
        );
        let controls = ControlSet::default().with_action_down(InputAction::Forward);

        for _ in 0..10 {
            registry.step(0.1, &controls, Suspension { player: true });
        }

        assert_eq!(
            registry.find_movable(player).expect("player").ship.position,
            Vec2::new(100.0, 100.0)
        );
        assert!(registry.find_movable(npc).expect("npc").ship.position.x > 300.0);
    }

    #[test]
    fn render_draws_planets_before_ships() {
        let mut registry = EntityManager::default();
        registry.add_player(ship_at(0.0, 0.0));
        registry.add_static(planet("late", 10.0, 10.0, 5.0));
        let mut presenter = RecordingPresenter::default();

        registry.render(&mut presenter, &Camera2D::default());

        assert_eq!(
            presenter.draws,
            vec![
                DrawCall::Planet("late".to_string()),
                DrawCall::Ship(EntityRole::Player)
            ]
        );
    }

    #[test]
    fn confine_clamps_movables_into_bounds() {
        let mut registry = EntityManager::default();
        let player = registry.add_player(ship_at(-40.0, 5000.0));
        registry.confine(WorldBounds {
            width: 1000.0,
            height: 1000.0,
        });
        let ship = &registry.find_movable(player).expect("player").ship;
        assert_eq!(ship.position, Vec2::new(ship.radius(), 1000.0 - ship.radius()));
    }
}
