//! Arcade drive mapping from the two sticks to the drivetrain.

use core::fmt;

use crate::actuator::ActuatorFault;
use crate::config::{DriveConfig, TurnAttenuation};
use crate::input::{AXIS_MAX, AXIS_MIN, AxisId, ControllerInput};

/// One arcade-drive request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DriveCommand {
    pub forward: i8,
    pub turn: i8,
    pub attenuation: TurnAttenuation,
}

impl DriveCommand {
    #[must_use]
    pub const fn new(forward: i8, turn: i8, attenuation: TurnAttenuation) -> Self {
        Self {
            forward,
            turn,
            attenuation,
        }
    }

    /// Sticks centered; what the drivetrain receives when driver control stops.
    #[must_use]
    pub const fn neutral() -> Self {
        Self::new(0, 0, TurnAttenuation::NONE)
    }

    pub const fn is_neutral(&self) -> bool {
        self.forward == 0 && self.turn == 0
    }

    /// Turn value after attenuation.
    pub const fn effective_turn(&self) -> i8 {
        self.attenuation.apply(self.turn)
    }

    /// Converts the request into `(left, right)` wheel powers.
    pub const fn mix(&self) -> (i8, i8) {
        let forward = self.forward as i16;
        let turn = self.effective_turn() as i16;
        (clamp_power(forward + turn), clamp_power(forward - turn))
    }
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arcade fwd={:+} turn={:+} atten={}%",
            self.forward,
            self.turn,
            self.attenuation.as_percent()
        )
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn clamp_power(value: i16) -> i8 {
    if value > AXIS_MAX as i16 {
        AXIS_MAX
    } else if value < AXIS_MIN as i16 {
        AXIS_MIN
    } else {
        value as i8
    }
}

/// Write capability over the drivetrain.
pub trait DrivetrainOutput {
    fn arcade_drive(&mut self, command: DriveCommand) -> Result<(), ActuatorFault>;
}

impl<T> DrivetrainOutput for &mut T
where
    T: DrivetrainOutput + ?Sized,
{
    fn arcade_drive(&mut self, command: DriveCommand) -> Result<(), ActuatorFault> {
        (**self).arcade_drive(command)
    }
}

/// Drivetrain sink that accepts and discards every command.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDrivetrain;

impl DrivetrainOutput for NoopDrivetrain {
    fn arcade_drive(&mut self, _: DriveCommand) -> Result<(), ActuatorFault> {
        Ok(())
    }
}

/// Outcome of one drive tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DriveReport {
    pub command: DriveCommand,
    pub fault: Option<ActuatorFault>,
}

/// Stateless drive loop body: sample, shape, forward.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DriveCommandLoop {
    config: DriveConfig,
}

impl DriveCommandLoop {
    #[must_use]
    pub const fn new(config: DriveConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Builds the command for the current stick positions.
    pub fn command<C>(&self, input: &C) -> DriveCommand
    where
        C: ControllerInput + ?Sized,
    {
        DriveCommand::new(
            self.shape(input.read_analog(AxisId::Forward)),
            self.shape(input.read_analog(AxisId::Turn)),
            self.config.turn_attenuation,
        )
    }

    /// Runs one tick. Exactly one command reaches the drivetrain per call.
    pub fn tick<C, D>(&self, input: &C, drivetrain: &mut D) -> DriveReport
    where
        C: ControllerInput + ?Sized,
        D: DrivetrainOutput + ?Sized,
    {
        let command = self.command(input);
        DriveReport {
            command,
            fault: drivetrain.arcade_drive(command).err(),
        }
    }

    /// Sends the neutral command used when driver control ends.
    pub fn stop<D>(&self, drivetrain: &mut D) -> Result<(), ActuatorFault>
    where
        D: DrivetrainOutput + ?Sized,
    {
        drivetrain.arcade_drive(DriveCommand {
            attenuation: self.config.turn_attenuation,
            ..DriveCommand::neutral()
        })
    }

    fn shape(&self, value: i8) -> i8 {
        if value.unsigned_abs() <= self.config.deadband {
            0
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ControllerSnapshot;
    use heapless::Vec;

    #[derive(Default)]
    struct Recorder {
        commands: Vec<DriveCommand, 8>,
    }

    impl DrivetrainOutput for Recorder {
        fn arcade_drive(&mut self, command: DriveCommand) -> Result<(), ActuatorFault> {
            self.commands
                .push(command)
                .map_err(|_| ActuatorFault::QueueFull)
        }
    }

    fn sticks(forward: i8, turn: i8) -> ControllerSnapshot {
        ControllerSnapshot::neutral()
            .with_axis(AxisId::Forward, forward)
            .with_axis(AxisId::Turn, turn)
    }

    #[test]
    fn forwards_axes_every_tick() {
        let drive = DriveCommandLoop::default();
        let mut recorder = Recorder::default();

        drive.tick(&sticks(100, -20), &mut recorder);
        drive.tick(&sticks(0, 0), &mut recorder);

        assert_eq!(recorder.commands.len(), 2);
        assert_eq!(recorder.commands[0].forward, 100);
        assert_eq!(recorder.commands[0].turn, -20);
        assert!(recorder.commands[1].is_neutral());
    }

    #[test]
    fn deadband_zeroes_small_readings() {
        let drive = DriveCommandLoop::new(DriveConfig::new(TurnAttenuation::NONE, 5));
        let command = drive.command(&sticks(5, -6));
        assert_eq!(command.forward, 0);
        assert_eq!(command.turn, -6);
    }

    #[test]
    fn mix_clamps_and_attenuates() {
        let full = DriveCommand::new(127, 127, TurnAttenuation::NONE);
        assert_eq!(full.mix(), (127, 0));

        let spin = DriveCommand::new(0, -127, TurnAttenuation::percent(50));
        assert_eq!(spin.effective_turn(), -63);
        assert_eq!(spin.mix(), (-63, 63));

        let reverse = DriveCommand::new(-127, 127, TurnAttenuation::NONE);
        assert_eq!(reverse.mix(), (0, -127));
    }

    #[test]
    fn fault_is_reported_not_raised() {
        struct Offline;
        impl DrivetrainOutput for Offline {
            fn arcade_drive(&mut self, _: DriveCommand) -> Result<(), ActuatorFault> {
                Err(ActuatorFault::Disconnected)
            }
        }

        let report = DriveCommandLoop::default().tick(&sticks(10, 0), &mut Offline);
        assert_eq!(report.fault, Some(ActuatorFault::Disconnected));
        assert_eq!(report.command.forward, 10);
    }

    #[test]
    fn stop_sends_neutral() {
        let drive = DriveCommandLoop::default();
        let mut recorder = Recorder::default();
        drive.stop(&mut recorder).unwrap();
        assert!(recorder.commands[0].is_neutral());
    }
}
