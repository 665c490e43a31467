use std::f32::consts::TAU;

use super::math::Vec2;

/// Passive slow-down applied while neither thrust control is held, as a
/// fraction of the ship's deceleration.
const IDLE_DRAG_FRACTION: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRole {
    Player,
    Npc,
}

/// Base physical limits before the speed-scale and size-scale multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipTuning {
    pub base_acceleration: f32,
    pub base_deceleration: f32,
    pub base_rotation_rate: f32,
    pub base_max_speed: f32,
    pub base_radius: f32,
    pub boost_speed: f32,
    pub boost_max_charge: f32,
    pub boost_drain_per_second: f32,
    pub boost_regen_per_second: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            base_acceleration: 240.0,
            base_deceleration: 320.0,
            base_rotation_rate: 3.5,
            base_max_speed: 320.0,
            base_radius: 14.0,
            boost_speed: 260.0,
            boost_max_charge: 100.0,
            boost_drain_per_second: 50.0,
            boost_regen_per_second: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Thrust {
    #[default]
    Idle,
    Forward,
    Reverse,
}

/// What a motion model asks the ship to do for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipCommand {
    pub thrust: Thrust,
    /// -1.0 turns left at full rate, 1.0 turns right.
    pub turn: f32,
    pub boost: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    pub position: Vec2,
    heading: f32,
    speed: f32,
    boost_overlay: f32,
    boost_charge: f32,
    tuning: ShipTuning,
    speed_scale: f32,
    size_scale: f32,
}

impl Ship {
    pub fn new(position: Vec2, heading: f32, tuning: ShipTuning) -> Self {
        Self {
            position,
            heading: heading.rem_euclid(TAU),
            speed: 0.0,
            boost_overlay: 0.0,
            boost_charge: tuning.boost_max_charge,
            tuning,
            speed_scale: 1.0,
            size_scale: 1.0,
        }
    }

    pub fn with_scales(mut self, speed_scale: f32, size_scale: f32) -> Self {
        self.set_speed_scale(speed_scale);
        self.set_size_scale(size_scale);
        self
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Sets the scalar speed, clamped to the current max speed.
    pub fn set_speed(&mut self, speed: f32) {
        let max_speed = self.max_speed();
        self.speed = speed.clamp(-max_speed, max_speed);
    }

    pub fn boost_overlay(&self) -> f32 {
        self.boost_overlay
    }

    pub fn boost_charge(&self) -> f32 {
        self.boost_charge
    }

    pub fn boost_max_charge(&self) -> f32 {
        self.tuning.boost_max_charge
    }

    pub fn acceleration(&self) -> f32 {
        self.tuning.base_acceleration * self.speed_scale
    }

    pub fn deceleration(&self) -> f32 {
        self.tuning.base_deceleration * self.speed_scale
    }

    pub fn rotation_rate(&self) -> f32 {
        self.tuning.base_rotation_rate * self.speed_scale
    }

    pub fn max_speed(&self) -> f32 {
        self.tuning.base_max_speed * self.speed_scale
    }

    pub fn radius(&self) -> f32 {
        self.tuning.base_radius * self.size_scale
    }

    pub fn speed_scale(&self) -> f32 {
        self.speed_scale
    }

    pub fn size_scale(&self) -> f32 {
        self.size_scale
    }

    pub fn set_speed_scale(&mut self, speed_scale: f32) {
        self.speed_scale = speed_scale;
        self.set_speed(self.speed);
    }

    pub fn set_size_scale(&mut self, size_scale: f32) {
        self.size_scale = size_scale;
    }

    pub fn advance(&mut self, command: ShipCommand, dt_seconds: f32) {
        let turn = command.turn.clamp(-1.0, 1.0);
        self.heading = (self.heading + turn * self.rotation_rate() * dt_seconds).rem_euclid(TAU);

        let next_speed = match command.thrust {
            Thrust::Forward => self.speed + self.acceleration() * dt_seconds,
            Thrust::Reverse => self.speed - self.deceleration() * dt_seconds,
            Thrust::Idle => {
                let drag = self.deceleration() * IDLE_DRAG_FRACTION * dt_seconds;
                if self.speed.abs() <= drag {
                    0.0
                } else {
                    self.speed - drag * self.speed.signum()
                }
            }
        };
        self.set_speed(next_speed);

        if command.boost && self.boost_charge > 0.0 {
            self.boost_overlay = self.tuning.boost_speed * self.speed_scale;
            self.boost_charge = (self.boost_charge
                - self.tuning.boost_drain_per_second * dt_seconds)
                .max(0.0);
        } else {
            self.boost_overlay = 0.0;
            if !command.boost {
                self.boost_charge = (self.boost_charge
                    + self.tuning.boost_regen_per_second * dt_seconds)
                    .min(self.tuning.boost_max_charge);
            }
        }

        let travel = (self.speed + self.boost_overlay) * dt_seconds;
        self.position = self
            .position
            .offset(Vec2::from_heading(self.heading).scaled(travel));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    pub position: Vec2,
    pub radius: f32,
    pub color: [u8; 4],
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship() -> Ship {
        Ship::new(Vec2::ZERO, 0.0, ShipTuning::default())
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert_eq!(first, EntityId(0));
        assert_eq!(second, EntityId(1));
    }

    #[test]
    fn forward_thrust_saturates_at_max_speed() {
        let mut ship = ship();
        let command = ShipCommand {
            thrust: Thrust::Forward,
            ..ShipCommand::default()
        };
        for _ in 0..600 {
            ship.advance(command, 1.0 / 60.0);
            assert!(ship.speed().abs() <= ship.max_speed());
        }
        assert!((ship.speed() - ship.max_speed()).abs() < 0.001);
        assert!(ship.position.x > 0.0);
    }

    #[test]
    fn reverse_thrust_is_clamped_to_negative_max() {
        let mut ship = ship();
        let command = ShipCommand {
            thrust: Thrust::Reverse,
            ..ShipCommand::default()
        };
        for _ in 0..600 {
            ship.advance(command, 1.0 / 60.0);
        }
        assert!((ship.speed() + ship.max_speed()).abs() < 0.001);
    }

    #[test]
    fn idle_drag_brings_ship_to_rest() {
        let mut ship = ship();
        ship.set_speed(100.0);
        for _ in 0..600 {
            ship.advance(ShipCommand::default(), 1.0 / 60.0);
        }
        assert_eq!(ship.speed(), 0.0);
    }

    #[test]
    fn boost_overlay_rides_on_top_of_clamped_speed() {
        let mut ship = ship();
        ship.set_speed(ship.max_speed());
        let charge_before = ship.boost_charge();
        ship.advance(
            ShipCommand {
                thrust: Thrust::Forward,
                boost: true,
                ..ShipCommand::default()
            },
            0.1,
        );

        assert!((ship.speed() - ship.max_speed()).abs() < 0.001);
        assert!(ship.boost_overlay() > 0.0);
        assert!(ship.boost_charge() < charge_before);
        let expected_travel = (ship.max_speed() + ship.boost_overlay()) * 0.1;
        assert!((ship.position.x - expected_travel).abs() < 0.01);
    }

    #[test]
    fn boost_stops_when_charge_is_empty_and_regenerates_when_released() {
        let mut ship = ship();
        let boost = ShipCommand {
            boost: true,
            ..ShipCommand::default()
        };
        for _ in 0..400 {
            ship.advance(boost, 0.05);
        }
        assert_eq!(ship.boost_charge(), 0.0);
        ship.advance(boost, 0.05);
        assert_eq!(ship.boost_overlay(), 0.0);

        ship.advance(ShipCommand::default(), 1.0);
        assert!(ship.boost_charge() > 0.0);
        assert!(ship.boost_charge() <= ship.boost_max_charge());
    }

    #[test]
    fn speed_scale_scales_limits_and_reclamps_speed() {
        let mut ship = ship();
        ship.set_speed(ship.max_speed());
        ship.set_speed_scale(0.5);

        let tuning = ShipTuning::default();
        assert!((ship.max_speed() - tuning.base_max_speed * 0.5).abs() < 0.001);
        assert!((ship.acceleration() - tuning.base_acceleration * 0.5).abs() < 0.001);
        assert!(ship.speed() <= ship.max_speed());
    }

    #[test]
    fn turning_wraps_heading_into_full_circle() {
        let mut ship = ship();
        ship.advance(
            ShipCommand {
                turn: -1.0,
                ..ShipCommand::default()
            },
            0.5,
        );
        assert!(ship.heading() >= 0.0 && ship.heading() < TAU);
    }
}
