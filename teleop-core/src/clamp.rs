//! Clamp toggle state machine.

use crate::actuator::{ActuatorCommand, ActuatorId};

/// Logical clamp position.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ClampState {
    /// Idle position; the solenoid output is de-asserted.
    #[default]
    Open,
    Closed,
}

impl ClampState {
    pub const fn toggled(self) -> Self {
        match self {
            ClampState::Open => ClampState::Closed,
            ClampState::Closed => ClampState::Open,
        }
    }

    /// Digital output level that realizes this state.
    pub const fn output_asserted(self) -> bool {
        matches!(self, ClampState::Closed)
    }
}

/// Owns the clamp state and turns toggle presses into output commands.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ClampMachine {
    state: ClampState,
}

impl ClampMachine {
    pub const fn new() -> Self {
        Self {
            state: ClampState::Open,
        }
    }

    pub const fn state(&self) -> ClampState {
        self.state
    }

    /// Handles a Clamp-toggle press.
    pub fn on_press(&mut self) -> ActuatorCommand {
        self.state = self.state.toggled();
        ActuatorCommand::SetDigital {
            id: ActuatorId::Clamp,
            asserted: self.state.output_asserted(),
        }
    }

    pub fn reset(&mut self) {
        self.state = ClampState::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_toggles_and_drives_output() {
        let mut clamp = ClampMachine::new();
        assert_eq!(
            clamp.on_press(),
            ActuatorCommand::SetDigital {
                id: ActuatorId::Clamp,
                asserted: true
            }
        );
        assert_eq!(clamp.state(), ClampState::Closed);
        assert_eq!(
            clamp.on_press(),
            ActuatorCommand::SetDigital {
                id: ActuatorId::Clamp,
                asserted: false
            }
        );
        assert_eq!(clamp.state(), ClampState::Open);
    }

    #[test]
    fn even_presses_return_to_open() {
        for presses in [2usize, 4, 10] {
            let mut clamp = ClampMachine::new();
            for _ in 0..presses {
                clamp.on_press();
            }
            assert_eq!(clamp.state(), ClampState::Open);
        }

        let mut clamp = ClampMachine::new();
        for _ in 0..3 {
            clamp.on_press();
        }
        assert_eq!(clamp.state(), ClampState::Closed);
        clamp.reset();
        assert_eq!(clamp.state(), ClampState::Open);
    }
}
