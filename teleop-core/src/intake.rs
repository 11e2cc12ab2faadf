//! Reversible intake state machine.
//!
//! A single button both starts and stops its own direction. The opposite
//! button always redirects a running intake instead of stopping it, which
//! saves a stop-then-start round trip during a match. When both buttons fire
//! on the same tick, forward wins.

use crate::actuator::{ActuatorCommand, ActuatorId, MotorPower};
use crate::config::IntakeConfig;
use crate::input::ButtonId;

/// Logical intake state.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum IntakeState {
    #[default]
    Idle,
    RunningForward,
    RunningReverse,
}

impl IntakeState {
    pub const fn running(self) -> bool {
        !matches!(self, IntakeState::Idle)
    }

    /// Only meaningful while [`running`](Self::running) is `true`.
    pub const fn reversed(self) -> bool {
        matches!(self, IntakeState::RunningReverse)
    }
}

/// Which intake button a press belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IntakeDirection {
    Forward,
    Reverse,
}

impl IntakeDirection {
    pub const fn button(self) -> ButtonId {
        match self {
            IntakeDirection::Forward => ButtonId::IntakeForward,
            IntakeDirection::Reverse => ButtonId::IntakeReverse,
        }
    }

    const fn running_state(self) -> IntakeState {
        match self {
            IntakeDirection::Forward => IntakeState::RunningForward,
            IntakeDirection::Reverse => IntakeState::RunningReverse,
        }
    }
}

/// Picks the press that wins when both intake buttons may fire together.
pub const fn resolve_presses(forward: bool, reverse: bool) -> Option<IntakeDirection> {
    if forward {
        Some(IntakeDirection::Forward)
    } else if reverse {
        Some(IntakeDirection::Reverse)
    } else {
        None
    }
}

/// Owns the intake state and turns presses into motor commands.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IntakeMachine {
    state: IntakeState,
    power: MotorPower,
}

impl IntakeMachine {
    pub const fn new(config: IntakeConfig) -> Self {
        Self {
            state: IntakeState::Idle,
            power: config.power,
        }
    }

    pub const fn state(&self) -> IntakeState {
        self.state
    }

    /// Handles one press of an intake button.
    pub fn on_press(&mut self, direction: IntakeDirection) -> ActuatorCommand {
        let running = direction.running_state();
        if self.state == running {
            self.state = IntakeState::Idle;
            return ActuatorCommand::MotorBrake {
                id: ActuatorId::Intake,
            };
        }

        self.state = running;
        let power = match direction {
            IntakeDirection::Forward => self.power,
            IntakeDirection::Reverse => -self.power,
        };
        ActuatorCommand::MotorPower {
            id: ActuatorId::Intake,
            power,
        }
    }

    /// Applies same-tick presses with forward precedence.
    pub fn on_presses(&mut self, forward: bool, reverse: bool) -> Option<(IntakeDirection, ActuatorCommand)> {
        let direction = resolve_presses(forward, reverse)?;
        Some((direction, self.on_press(direction)))
    }

    /// Command that leaves the motor in a safe state.
    pub const fn safe_command(&self) -> ActuatorCommand {
        ActuatorCommand::MotorBrake {
            id: ActuatorId::Intake,
        }
    }

    pub fn reset(&mut self) {
        self.state = IntakeState::Idle;
    }
}

impl Default for IntakeMachine {
    fn default() -> Self {
        Self::new(IntakeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power(value: i8) -> ActuatorCommand {
        ActuatorCommand::MotorPower {
            id: ActuatorId::Intake,
            power: MotorPower::new(value),
        }
    }

    const BRAKE: ActuatorCommand = ActuatorCommand::MotorBrake {
        id: ActuatorId::Intake,
    };

    #[test]
    fn same_button_starts_and_stops() {
        let mut intake = IntakeMachine::default();
        assert_eq!(intake.on_press(IntakeDirection::Forward), power(127));
        assert_eq!(intake.state(), IntakeState::RunningForward);
        assert_eq!(intake.on_press(IntakeDirection::Forward), BRAKE);
        assert_eq!(intake.state(), IntakeState::Idle);

        assert_eq!(intake.on_press(IntakeDirection::Reverse), power(-127));
        assert_eq!(intake.state(), IntakeState::RunningReverse);
        assert_eq!(intake.on_press(IntakeDirection::Reverse), BRAKE);
        assert_eq!(intake.state(), IntakeState::Idle);
    }

    #[test]
    fn opposite_button_redirects() {
        let mut intake = IntakeMachine::default();
        intake.on_press(IntakeDirection::Forward);
        assert_eq!(intake.on_press(IntakeDirection::Reverse), power(-127));
        assert_eq!(intake.state(), IntakeState::RunningReverse);
        assert_eq!(intake.on_press(IntakeDirection::Forward), power(127));
        assert_eq!(intake.state(), IntakeState::RunningForward);
    }

    #[test]
    fn forward_wins_simultaneous_presses() {
        let mut intake = IntakeMachine::default();
        let (direction, command) = intake.on_presses(true, true).expect("press expected");
        assert_eq!(direction, IntakeDirection::Forward);
        assert_eq!(command, power(127));
        assert_eq!(intake.state(), IntakeState::RunningForward);

        // From reverse, a simultaneous pair still resolves to forward (redirect).
        let mut intake = IntakeMachine::default();
        intake.on_press(IntakeDirection::Reverse);
        intake.on_presses(true, true);
        assert_eq!(intake.state(), IntakeState::RunningForward);

        assert_eq!(intake.on_presses(false, false), None);
    }

    #[test]
    fn state_flags_follow_mode() {
        assert!(!IntakeState::Idle.running());
        assert!(IntakeState::RunningForward.running());
        assert!(!IntakeState::RunningForward.reversed());
        assert!(IntakeState::RunningReverse.reversed());
    }
}
