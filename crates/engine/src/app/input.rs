#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Forward,
    Reverse,
    RotateLeft,
    RotateRight,
    Boost,
    Interact,
}

const ACTION_COUNT: usize = 6;

/// Logical controls currently held by the pilot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSet {
    down: [bool; ACTION_COUNT],
}

impl ControlSet {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn clear(&mut self, action: InputAction) {
        self.set(action, false);
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub fn release_all(&mut self) {
        self.down = [false; ACTION_COUNT];
    }

    pub fn with_action_down(mut self, action: InputAction) -> Self {
        self.set(action, true);
        self
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::Forward => 0,
            InputAction::Reverse => 1,
            InputAction::RotateLeft => 2,
            InputAction::RotateRight => 3,
            InputAction::Boost => 4,
            InputAction::Interact => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_only_touches_named_action() {
        let mut controls = ControlSet::default()
            .with_action_down(InputAction::Forward)
            .with_action_down(InputAction::Interact);
        controls.clear(InputAction::Interact);

        assert!(controls.is_down(InputAction::Forward));
        assert!(!controls.is_down(InputAction::Interact));
    }

    #[test]
    fn release_all_resets_every_action() {
        let mut controls = ControlSet::default()
            .with_action_down(InputAction::Boost)
            .with_action_down(InputAction::RotateLeft);
        controls.release_all();
        assert_eq!(controls, ControlSet::default());
    }
}
