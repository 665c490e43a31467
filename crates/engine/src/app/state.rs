use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use super::registry::Suspension;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum GameState {
    #[default]
    Flying,
    PlanetView,
}

impl GameState {
    pub const ALL: [GameState; 2] = [GameState::Flying, GameState::PlanetView];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Flying => "flying",
            Self::PlanetView => "planet_view",
        }
    }

    /// What the frame loop is allowed to do while this state is active.
    pub fn policy(self) -> StatePolicy {
        match self {
            Self::Flying => StatePolicy {
                step_world: true,
                suspend_player: false,
                interaction_checks: true,
            },
            Self::PlanetView => StatePolicy {
                step_world: true,
                suspend_player: true,
                interaction_checks: false,
            },
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("unknown game state '{0}'")]
    Unknown(String),
}

impl FromStr for GameState {
    type Err = StateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        GameState::ALL
            .into_iter()
            .find(|state| state.as_token().eq_ignore_ascii_case(token))
            .ok_or_else(|| StateError::Unknown(token.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatePolicy {
    pub step_world: bool,
    pub suspend_player: bool,
    pub interaction_checks: bool,
}

impl StatePolicy {
    pub fn suspension(self) -> Suspension {
        Suspension {
            player: self.suspend_player,
        }
    }
}

#[derive(Debug, Default)]
pub struct GameStateMachine {
    current: GameState,
    transitions: u64,
}

impl GameStateMachine {
    pub fn current(&self) -> GameState {
        self.current
    }

    pub fn policy(&self) -> StatePolicy {
        self.current.policy()
    }

    pub fn is(&self, state: GameState) -> bool {
        self.current == state
    }

    /// Number of state changes since start; same-state sets are not counted.
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Returns whether the active state changed.
    pub fn set_state(&mut self, next: GameState) -> bool {
        if self.current == next {
            return false;
        }
        info!(from = %self.current, to = %next, "game_state_changed");
        self.current = next;
        self.transitions = self.transitions.saturating_add(1);
        true
    }

    /// Textual variant of [`Self::set_state`]. Unknown names are logged and
    /// leave the active state alone.
    pub fn set_state_named(&mut self, raw: &str) -> Result<bool, StateError> {
        match raw.parse::<GameState>() {
            Ok(next) => Ok(self.set_state(next)),
            Err(error) => {
                warn!(requested = raw, current = %self.current, %error, "state_transition_rejected");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_flying() {
        let machine = GameStateMachine::default();
        assert_eq!(machine.current(), GameState::Flying);
        assert_eq!(machine.transition_count(), 0);
    }

    #[test]
    fn unknown_state_name_leaves_state_unchanged() {
        let mut machine = GameStateMachine::default();
        machine.set_state(GameState::PlanetView);

        let result = machine.set_state_named("market");

        assert_eq!(result, Err(StateError::Unknown("market".to_string())));
        assert_eq!(machine.current(), GameState::PlanetView);
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn known_state_changes_once_and_is_idempotent() {
        let mut machine = GameStateMachine::default();

        assert_eq!(machine.set_state_named("planet_view"), Ok(true));
        assert_eq!(machine.set_state_named("PLANET_VIEW"), Ok(false));
        assert!(!machine.set_state(GameState::PlanetView));

        assert_eq!(machine.current(), GameState::PlanetView);
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn tokens_round_trip_through_parse() {
        for state in GameState::ALL {
            assert_eq!(state.as_token().parse::<GameState>(), Ok(state));
        }
    }

    #[test]
    fn planet_view_suspends_player_but_keeps_world_running() {
        let policy = GameState::PlanetView.policy();
        assert!(policy.step_world);
        assert!(policy.suspend_player);
        assert!(!policy.interaction_checks);

        let flying = GameState::Flying.policy();
        assert!(flying.interaction_checks);
        assert_eq!(flying.suspension(), Suspension::default());
    }
}
