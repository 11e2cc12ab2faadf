//! Arm state machine: toggle positioning plus a level-driven jog override.
//!
//! The toggle flips between the stowed and deployed setpoints and hands the
//! move to the motor's own position controller. While deployed, holding a jog
//! button drives the motor open-loop every tick; dropping the jog level issues
//! a single hold command. Jog input is ignored while stowed so the toggle
//! state stays the source of truth for where closed-loop holding resumes.

use crate::actuator::{ActuatorCommand, ActuatorId, Degrees};
use crate::config::{ArmConfig, JogRelease};

/// Direction requested by the jog buttons.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JogDirection {
    Up,
    Down,
}

/// Jog substate layered on top of the toggle state.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum JogState {
    /// Closed-loop holding at the target setpoint.
    #[default]
    Holding,
    Jogging(JogDirection),
}

/// Logical arm state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArmState {
    pub active: bool,
    pub target: Degrees,
    pub jog: JogState,
}

/// Owns the arm state and produces position, jog and hold commands.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArmMachine {
    config: ArmConfig,
    state: ArmState,
}

impl ArmMachine {
    pub const fn new(config: ArmConfig) -> Self {
        Self {
            config,
            state: ArmState {
                active: false,
                target: config.stowed,
                jog: JogState::Holding,
            },
        }
    }

    pub const fn state(&self) -> ArmState {
        self.state
    }

    pub const fn config(&self) -> &ArmConfig {
        &self.config
    }

    /// Handles an Arm-toggle press.
    ///
    /// Any jog in progress is abandoned; the new setpoint takes over immediately.
    pub fn on_toggle(&mut self) -> ActuatorCommand {
        self.state.active = !self.state.active;
        self.state.target = if self.state.active {
            self.config.deployed
        } else {
            self.config.stowed
        };
        self.state.jog = JogState::Holding;
        self.hold_setpoint()
    }

    /// Applies this tick's jog levels. Up wins when both are held.
    pub fn on_jog_levels(&mut self, up: bool, down: bool) -> Option<ActuatorCommand> {
        if !self.state.active {
            return None;
        }

        let requested = if up {
            Some(JogDirection::Up)
        } else if down {
            Some(JogDirection::Down)
        } else {
            None
        };

        match (requested, self.state.jog) {
            (Some(direction), _) => {
                self.state.jog = JogState::Jogging(direction);
                let power = match direction {
                    JogDirection::Up => self.config.jog_power,
                    JogDirection::Down => -self.config.jog_power,
                };
                Some(ActuatorCommand::MotorPower {
                    id: ActuatorId::Arm,
                    power,
                })
            }
            (None, JogState::Jogging(_)) => {
                self.state.jog = JogState::Holding;
                Some(self.release_command())
            }
            (None, JogState::Holding) => None,
        }
    }

    /// Command that leaves the arm in a safe state.
    pub const fn safe_command(&self) -> ActuatorCommand {
        ActuatorCommand::MotorBrake {
            id: ActuatorId::Arm,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    const fn hold_setpoint(&self) -> ActuatorCommand {
        ActuatorCommand::MotorToPosition {
            id: ActuatorId::Arm,
            target: self.state.target,
            max_speed: self.config.max_speed,
        }
    }

    const fn release_command(&self) -> ActuatorCommand {
        match self.config.jog_release {
            JogRelease::ResumeSetpoint => self.hold_setpoint(),
            JogRelease::Brake => self.safe_command(),
        }
    }
}

impl Default for ArmMachine {
    fn default() -> Self {
        Self::new(ArmConfig::default())
    }
}
