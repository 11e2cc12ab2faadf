//! Serial framing for the controller radio and the actuator driver board.
//!
//! Both directions use fixed-size frames that open with a sync byte and close
//! with an XOR checksum over everything in between. The controller side is
//! decoded byte-by-byte straight off the UART so a dropped byte costs at most
//! one frame before the decoder locks back onto the next sync byte.

use core::fmt;

use teleop_core::actuator::{ActuatorCommand, ActuatorId, Degrees, MotorPower};
use teleop_core::config::TurnAttenuation;
use teleop_core::drive::DriveCommand;
use teleop_core::input::ControllerSnapshot;

/// First byte of every controller frame.
pub const CONTROLLER_SYNC: u8 = 0xC5;
/// `[sync, buttons, forward, turn, checksum]`.
pub const CONTROLLER_FRAME_SIZE: usize = 5;

/// First byte of every actuator frame.
pub const ACTUATOR_SYNC: u8 = 0xA7;
/// `[sync, opcode, target, p0, p1, p2, checksum]`.
pub const ACTUATOR_FRAME_SIZE: usize = 7;

/// Target byte used for drivetrain frames.
pub const DRIVETRAIN_TARGET: u8 = 0x10;

const OP_SET_DIGITAL: u8 = 0x01;
const OP_MOTOR_POWER: u8 = 0x02;
const OP_MOTOR_BRAKE: u8 = 0x03;
const OP_MOTOR_TO_POSITION: u8 = 0x04;
const OP_ARCADE_DRIVE: u8 = 0x05;

/// Encoded actuator frame.
pub type ActuatorFrame = [u8; ACTUATOR_FRAME_SIZE];

/// Framing failures on either link.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameError {
    Checksum { expected: u8, actual: u8 },
    BadSync(u8),
    UnknownOpcode(u8),
    UnknownTarget(u8),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Checksum { expected, actual } => {
                write!(f, "checksum expected={expected:#04x} actual={actual:#04x}")
            }
            FrameError::BadSync(byte) => write!(f, "bad sync {byte:#04x}"),
            FrameError::UnknownOpcode(op) => write!(f, "unknown opcode {op:#04x}"),
            FrameError::UnknownTarget(target) => write!(f, "unknown target {target:#04x}"),
        }
    }
}

/// XOR of every byte in `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Builds a controller frame; used by bench tools and tests.
pub fn encode_controller(snapshot: &ControllerSnapshot) -> [u8; CONTROLLER_FRAME_SIZE] {
    let forward = snapshot.axis(teleop_core::input::AxisId::Forward).to_le_bytes()[0];
    let turn = snapshot.axis(teleop_core::input::AxisId::Turn).to_le_bytes()[0];
    let body = [snapshot.buttons(), forward, turn];
    [
        CONTROLLER_SYNC,
        body[0],
        body[1],
        body[2],
        checksum(&body),
    ]
}

/// Streaming decoder for controller frames.
#[derive(Clone, Debug, Default)]
pub struct ControllerFrameDecoder {
    buffer: [u8; CONTROLLER_FRAME_SIZE],
    filled: usize,
}

impl ControllerFrameDecoder {
    pub const fn new() -> Self {
        Self {
            buffer: [0; CONTROLLER_FRAME_SIZE],
            filled: 0,
        }
    }

    /// Feeds one byte. Returns a result once a full frame has been collected.
    ///
    /// Bytes outside a frame are skipped until the next sync byte.
    pub fn push(&mut self, byte: u8) -> Option<Result<ControllerSnapshot, FrameError>> {
        if self.filled == 0 && byte != CONTROLLER_SYNC {
            return None;
        }

        self.buffer[self.filled] = byte;
        self.filled += 1;
        if self.filled < CONTROLLER_FRAME_SIZE {
            return None;
        }
        self.filled = 0;

        let body = &self.buffer[1..CONTROLLER_FRAME_SIZE - 1];
        let expected = checksum(body);
        let actual = self.buffer[CONTROLLER_FRAME_SIZE - 1];
        if expected != actual {
            return Some(Err(FrameError::Checksum { expected, actual }));
        }

        Some(Ok(ControllerSnapshot::from_raw(
            body[0],
            i8::from_le_bytes([body[1]]),
            i8::from_le_bytes([body[2]]),
        )))
    }

    /// Feeds a chunk, calling `on_frame` for each completed frame.
    pub fn extend<F>(&mut self, bytes: &[u8], mut on_frame: F)
    where
        F: FnMut(Result<ControllerSnapshot, FrameError>),
    {
        for &byte in bytes {
            if let Some(frame) = self.push(byte) {
                on_frame(frame);
            }
        }
    }
}

/// Anything the loops ask the actuator board to do.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinkCommand {
    Actuator(ActuatorCommand),
    Drive(DriveCommand),
}

impl fmt::Display for LinkCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkCommand::Actuator(command) => fmt::Display::fmt(command, f),
            LinkCommand::Drive(command) => fmt::Display::fmt(command, f),
        }
    }
}

impl LinkCommand {
    /// Encodes the command into a single actuator frame.
    pub fn encode(&self) -> ActuatorFrame {
        let (opcode, target, params) = match *self {
            LinkCommand::Actuator(ActuatorCommand::SetDigital { id, asserted }) => {
                (OP_SET_DIGITAL, actuator_target(id), [u8::from(asserted), 0, 0])
            }
            LinkCommand::Actuator(ActuatorCommand::MotorPower { id, power }) => (
                OP_MOTOR_POWER,
                actuator_target(id),
                [power.get().to_le_bytes()[0], 0, 0],
            ),
            LinkCommand::Actuator(ActuatorCommand::MotorBrake { id }) => {
                (OP_MOTOR_BRAKE, actuator_target(id), [0, 0, 0])
            }
            LinkCommand::Actuator(ActuatorCommand::MotorToPosition {
                id,
                target,
                max_speed,
            }) => {
                let [lo, hi] = target.get().to_le_bytes();
                (OP_MOTOR_TO_POSITION, actuator_target(id), [lo, hi, max_speed])
            }
            LinkCommand::Drive(command) => (
                OP_ARCADE_DRIVE,
                DRIVETRAIN_TARGET,
                [
                    command.forward.to_le_bytes()[0],
                    command.turn.to_le_bytes()[0],
                    command.attenuation.as_percent(),
                ],
            ),
        };

        let mut frame = [ACTUATOR_SYNC, opcode, target, params[0], params[1], params[2], 0];
        frame[ACTUATOR_FRAME_SIZE - 1] = checksum(&frame[1..ACTUATOR_FRAME_SIZE - 1]);
        frame
    }

    /// Parses an actuator frame as the driver board would.
    pub fn decode(frame: &ActuatorFrame) -> Result<Self, FrameError> {
        if frame[0] != ACTUATOR_SYNC {
            return Err(FrameError::BadSync(frame[0]));
        }
        let expected = checksum(&frame[1..ACTUATOR_FRAME_SIZE - 1]);
        let actual = frame[ACTUATOR_FRAME_SIZE - 1];
        if expected != actual {
            return Err(FrameError::Checksum { expected, actual });
        }

        let [_, opcode, target, p0, p1, p2, _] = *frame;
        if opcode == OP_ARCADE_DRIVE {
            if target != DRIVETRAIN_TARGET {
                return Err(FrameError::UnknownTarget(target));
            }
            return Ok(LinkCommand::Drive(DriveCommand::new(
                i8::from_le_bytes([p0]),
                i8::from_le_bytes([p1]),
                TurnAttenuation::percent(p2),
            )));
        }

        let id = ActuatorId::from_index(usize::from(target)).ok_or(FrameError::UnknownTarget(target))?;
        let command = match opcode {
            OP_SET_DIGITAL => ActuatorCommand::SetDigital {
                id,
                asserted: p0 != 0,
            },
            OP_MOTOR_POWER => ActuatorCommand::MotorPower {
                id,
                power: MotorPower::new(i8::from_le_bytes([p0])),
            },
            OP_MOTOR_BRAKE => ActuatorCommand::MotorBrake { id },
            OP_MOTOR_TO_POSITION => ActuatorCommand::MotorToPosition {
                id,
                target: Degrees::new(i16::from_le_bytes([p0, p1])),
                max_speed: p2,
            },
            other => return Err(FrameError::UnknownOpcode(other)),
        };
        Ok(LinkCommand::Actuator(command))
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn actuator_target(id: ActuatorId) -> u8 {
    id.as_index() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use teleop_core::input::{AxisId, ButtonId};

    #[test]
    fn decoder_resyncs_after_noise() {
        let snapshot = ControllerSnapshot::neutral()
            .with_button(ButtonId::IntakeForward, true)
            .with_axis(AxisId::Forward, -90)
            .with_axis(AxisId::Turn, 12);
        let frame = encode_controller(&snapshot);

        let mut stream = heapless::Vec::<u8, 16>::new();
        stream.extend_from_slice(&[0x00, 0x42, 0xFF]).unwrap();
        stream.extend_from_slice(&frame).unwrap();

        let mut decoder = ControllerFrameDecoder::new();
        let mut decoded = heapless::Vec::<_, 2>::new();
        decoder.extend(&stream, |result| decoded.push(result).unwrap());

        assert_eq!(decoded.as_slice(), &[Ok(snapshot)]);
    }

    #[test]
    fn decoder_rejects_bad_checksum_and_recovers() {
        let good = encode_controller(&ControllerSnapshot::neutral().with_button(ButtonId::ClampToggle, true));
        let mut bad = good;
        bad[4] ^= 0x01;

        let mut decoder = ControllerFrameDecoder::new();
        let mut results = heapless::Vec::<_, 4>::new();
        decoder.extend(&bad, |result| results.push(result).unwrap());
        decoder.extend(&good, |result| results.push(result).unwrap());

        assert!(matches!(results[0], Err(FrameError::Checksum { .. })));
        assert!(results[1].as_ref().is_ok_and(|s| s.is_held(ButtonId::ClampToggle)));
    }

    #[test]
    fn actuator_frames_carry_signed_payloads() {
        let frame = LinkCommand::Actuator(ActuatorCommand::MotorPower {
            id: ActuatorId::Intake,
            power: MotorPower::FULL_REVERSE,
        })
        .encode();
        assert_eq!(frame[..3], [ACTUATOR_SYNC, OP_MOTOR_POWER, 1]);
        assert_eq!(frame[3], 0x81);
        assert_eq!(frame[6], checksum(&frame[1..6]));

        let arm = LinkCommand::Actuator(ActuatorCommand::MotorToPosition {
            id: ActuatorId::Arm,
            target: Degrees::new(-170),
            max_speed: 100,
        });
        assert_eq!(LinkCommand::decode(&arm.encode()), Ok(arm));
    }

    #[test]
    fn drive_frames_use_drivetrain_target() {
        let drive = LinkCommand::Drive(DriveCommand::new(-127, 64, TurnAttenuation::percent(80)));
        let frame = drive.encode();
        assert_eq!(frame[1], OP_ARCADE_DRIVE);
        assert_eq!(frame[2], DRIVETRAIN_TARGET);
        assert_eq!(LinkCommand::decode(&frame), Ok(drive));
    }

    #[test]
    fn decode_reports_framing_errors() {
        let mut frame = LinkCommand::Actuator(ActuatorCommand::MotorBrake { id: ActuatorId::Arm }).encode();
        frame[0] = 0x00;
        assert_eq!(LinkCommand::decode(&frame), Err(FrameError::BadSync(0x00)));

        let mut frame = [ACTUATOR_SYNC, 0x09, 0, 0, 0, 0, 0];
        frame[6] = checksum(&frame[1..6]);
        assert_eq!(LinkCommand::decode(&frame), Err(FrameError::UnknownOpcode(0x09)));
    }
}
