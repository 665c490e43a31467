use super::entity::{Ship, ShipCommand, Thrust};
use super::input::{ControlSet, InputAction};

/// Everything a motion model may read while deciding a tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub dt_seconds: f32,
    pub controls: &'a ControlSet,
}

/// Decides how a movable entity advances one tick. The registry iterates
/// movables through this without knowing what drives them.
pub trait MotionModel {
    fn name(&self) -> &'static str;
    fn advance(&mut self, ship: &mut Ship, context: &TickContext<'_>);
}

/// Driven by the pilot's held controls.
#[derive(Debug, Default, Clone, Copy)]
pub struct PilotedMotion;

impl PilotedMotion {
    pub fn command_from_controls(controls: &ControlSet) -> ShipCommand {
        let thrust = match (
            controls.is_down(InputAction::Forward),
            controls.is_down(InputAction::Reverse),
        ) {
            (true, false) => Thrust::Forward,
            (false, true) => Thrust::Reverse,
            _ => Thrust::Idle,
        };

        let mut turn = 0.0f32;
        if controls.is_down(InputAction::RotateLeft) {
            turn -= 1.0;
        }
        if controls.is_down(InputAction::RotateRight) {
            turn += 1.0;
        }

        ShipCommand {
            thrust,
            turn,
            boost: controls.is_down(InputAction::Boost),
        }
    }
}

impl MotionModel for PilotedMotion {
    fn name(&self) -> &'static str {
        "piloted"
    }

    fn advance(&mut self, ship: &mut Ship, context: &TickContext<'_>) {
        let command = Self::command_from_controls(context.controls);
        ship.advance(command, context.dt_seconds);
    }
}

/// Holds a fixed thrust and turn regardless of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoastingMotion {
    pub command: ShipCommand,
}

impl MotionModel for CoastingMotion {
    fn name(&self) -> &'static str {
        "coasting"
    }

    fn advance(&mut self, ship: &mut Ship, context: &TickContext<'_>) {
        ship.advance(self.command, context.dt_seconds);
    }
}
