//! Actuator command vocabulary and the output capability the loops write to.
//!
//! Commands are fire-and-forget: the core issues each request once per state
//! transition and never waits for a position move to finish. Collaborators
//! that cannot honor a command report an [`ActuatorFault`]; the core keeps
//! whatever state it last decided and does not retry.

use core::fmt;
use core::ops::Neg;

/// Discrete actuators driven by the teleop input loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActuatorId {
    /// Pneumatic clamp on a digital output.
    Clamp,
    /// Reversible intake motor.
    Intake,
    /// Articulated arm motor with closed-loop positioning.
    Arm,
}

impl ActuatorId {
    pub const fn as_index(self) -> usize {
        match self {
            ActuatorId::Clamp => 0,
            ActuatorId::Intake => 1,
            ActuatorId::Arm => 2,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ActuatorId::Clamp),
            1 => Some(ActuatorId::Intake),
            2 => Some(ActuatorId::Arm),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ActuatorId::Clamp => "clamp",
            ActuatorId::Intake => "intake",
            ActuatorId::Arm => "arm",
        }
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signed open-loop motor power in `-127..=127`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct MotorPower(i8);

impl MotorPower {
    pub const FULL_FORWARD: Self = Self(127);
    pub const FULL_REVERSE: Self = Self(-127);
    pub const ZERO: Self = Self(0);

    /// Builds a power value, saturating `i8::MIN` to the symmetric limit.
    pub const fn new(value: i8) -> Self {
        if value == i8::MIN {
            Self(-127)
        } else {
            Self(value)
        }
    }

    pub const fn get(self) -> i8 {
        self.0
    }
}

impl Neg for MotorPower {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Joint angle in whole degrees as understood by the motor's position controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Degrees(i16);

impl Degrees {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: i16) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i16 {
        self.0
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}deg", self.0)
    }
}

/// One request for the actuator-command collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActuatorCommand {
    SetDigital {
        id: ActuatorId,
        asserted: bool,
    },
    MotorPower {
        id: ActuatorId,
        power: MotorPower,
    },
    MotorBrake {
        id: ActuatorId,
    },
    MotorToPosition {
        id: ActuatorId,
        target: Degrees,
        max_speed: u8,
    },
}

impl ActuatorCommand {
    /// Actuator addressed by this command.
    pub const fn actuator(&self) -> ActuatorId {
        match *self {
            ActuatorCommand::SetDigital { id, .. }
            | ActuatorCommand::MotorPower { id, .. }
            | ActuatorCommand::MotorBrake { id }
            | ActuatorCommand::MotorToPosition { id, .. } => id,
        }
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ActuatorCommand::SetDigital { id, asserted: true } => write!(f, "{id} assert"),
            ActuatorCommand::SetDigital {
                id,
                asserted: false,
            } => write!(f, "{id} de-assert"),
            ActuatorCommand::MotorPower { id, power } => write!(f, "{id} power {:+}", power.get()),
            ActuatorCommand::MotorBrake { id } => write!(f, "{id} brake"),
            ActuatorCommand::MotorToPosition {
                id,
                target,
                max_speed,
            } => write!(f, "{id} move-to {target} speed={max_speed}"),
        }
    }
}

/// Failure reported by the actuator-command collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActuatorFault {
    /// The device refused the command (for example a stalled or over-temperature motor).
    Rejected,
    /// The command queue toward the device is full.
    QueueFull,
    /// The device link is down.
    Disconnected,
}

impl fmt::Display for ActuatorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorFault::Rejected => f.write_str("rejected"),
            ActuatorFault::QueueFull => f.write_str("queue-full"),
            ActuatorFault::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Write capability over the clamp, intake and arm devices.
pub trait ActuatorOutput {
    /// Forwards one command to the device layer.
    fn apply(&mut self, command: ActuatorCommand) -> Result<(), ActuatorFault>;

    fn set_digital_output(&mut self, id: ActuatorId, asserted: bool) -> Result<(), ActuatorFault> {
        self.apply(ActuatorCommand::SetDigital { id, asserted })
    }

    fn command_motor_power(
        &mut self,
        id: ActuatorId,
        power: MotorPower,
    ) -> Result<(), ActuatorFault> {
        self.apply(ActuatorCommand::MotorPower { id, power })
    }

    fn command_motor_brake(&mut self, id: ActuatorId) -> Result<(), ActuatorFault> {
        self.apply(ActuatorCommand::MotorBrake { id })
    }

    fn command_motor_to_position(
        &mut self,
        id: ActuatorId,
        target: Degrees,
        max_speed: u8,
    ) -> Result<(), ActuatorFault> {
        self.apply(ActuatorCommand::MotorToPosition {
            id,
            target,
            max_speed,
        })
    }
}

impl<T> ActuatorOutput for &mut T
where
    T: ActuatorOutput + ?Sized,
{
    fn apply(&mut self, command: ActuatorCommand) -> Result<(), ActuatorFault> {
        (**self).apply(command)
    }
}

/// Actuator sink that accepts and discards every command.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopActuators;

impl NoopActuators {
    pub const fn new() -> Self {
        Self
    }
}

impl ActuatorOutput for NoopActuators {
    fn apply(&mut self, _: ActuatorCommand) -> Result<(), ActuatorFault> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    #[derive(Default)]
    struct Recorder {
        commands: Vec<ActuatorCommand, 8>,
    }

    impl ActuatorOutput for Recorder {
        fn apply(&mut self, command: ActuatorCommand) -> Result<(), ActuatorFault> {
            self.commands
                .push(command)
                .map_err(|_| ActuatorFault::QueueFull)
        }
    }

    #[test]
    fn convenience_methods_build_commands() {
        let mut recorder = Recorder::default();
        recorder.set_digital_output(ActuatorId::Clamp, true).unwrap();
        recorder
            .command_motor_power(ActuatorId::Intake, MotorPower::FULL_REVERSE)
            .unwrap();
        recorder.command_motor_brake(ActuatorId::Intake).unwrap();
        recorder
            .command_motor_to_position(ActuatorId::Arm, Degrees::new(90), 100)
            .unwrap();

        assert_eq!(
            recorder.commands.as_slice(),
            &[
                ActuatorCommand::SetDigital {
                    id: ActuatorId::Clamp,
                    asserted: true
                },
                ActuatorCommand::MotorPower {
                    id: ActuatorId::Intake,
                    power: MotorPower::new(-127)
                },
                ActuatorCommand::MotorBrake {
                    id: ActuatorId::Intake
                },
                ActuatorCommand::MotorToPosition {
                    id: ActuatorId::Arm,
                    target: Degrees::new(90),
                    max_speed: 100
                },
            ]
        );
    }

    #[test]
    fn motor_power_is_symmetric() {
        assert_eq!(MotorPower::new(i8::MIN), MotorPower::FULL_REVERSE);
        assert_eq!(-MotorPower::FULL_FORWARD, MotorPower::FULL_REVERSE);
    }

    #[test]
    fn commands_report_their_actuator() {
        let command = ActuatorCommand::MotorBrake {
            id: ActuatorId::Arm,
        };
        assert_eq!(command.actuator(), ActuatorId::Arm);
        assert_eq!(ActuatorId::from_index(command.actuator().as_index()), Some(ActuatorId::Arm));
    }
}
