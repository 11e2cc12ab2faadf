//! Calibration and timing constants for driver control.
//!
//! Everything here is compile-time data. Firmware and the emulator build a
//! [`TeleopConfig`] once and hand copies to the loops.

use core::time::Duration;

use crate::actuator::{Degrees, MotorPower};

/// Input loop period; dominated by the wait-for-release pattern.
pub const INPUT_LOOP_PERIOD: Duration = Duration::from_millis(50);
/// Drive loop period; the tighter bound because stick response is latency-sensitive.
pub const DRIVE_LOOP_PERIOD: Duration = Duration::from_millis(20);

/// Arm angle while folded inside the frame.
pub const ARM_STOWED: Degrees = Degrees::new(0);
/// Arm angle while raised to score.
pub const ARM_DEPLOYED: Degrees = Degrees::new(170);
/// Speed limit passed along with every arm position request.
pub const ARM_MAX_SPEED: u8 = 100;
/// Open-loop power applied while a jog level is held.
pub const ARM_JOG_POWER: MotorPower = MotorPower::new(64);

/// Intake power while running forward; reverse uses the negation.
pub const INTAKE_POWER: MotorPower = MotorPower::FULL_FORWARD;

/// Percentage of the turn stick forwarded to the drivetrain.
pub const TURN_ATTENUATION_PERCENT: u8 = 100;

/// Shortest period either loop may run at.
pub const MIN_LOOP_PERIOD: Duration = Duration::from_millis(1);

/// Periods for the two driver-control loops.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LoopPeriods {
    pub input: Duration,
    pub drive: Duration,
}

impl LoopPeriods {
    /// Periods shorter than [`MIN_LOOP_PERIOD`] are raised to it.
    pub const fn new(input: Duration, drive: Duration) -> Self {
        Self {
            input: at_least_min(input),
            drive: at_least_min(drive),
        }
    }
}

const fn at_least_min(period: Duration) -> Duration {
    if period.as_nanos() < MIN_LOOP_PERIOD.as_nanos() {
        MIN_LOOP_PERIOD
    } else {
        period
    }
}

impl Default for LoopPeriods {
    fn default() -> Self {
        Self::new(INPUT_LOOP_PERIOD, DRIVE_LOOP_PERIOD)
    }
}

/// Fixed scaling applied to the turn axis, clamped to `0..=100` percent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TurnAttenuation(u8);

impl TurnAttenuation {
    pub const NONE: Self = Self(100);

    pub const fn percent(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    pub const fn as_percent(self) -> u8 {
        self.0
    }

    /// Scales a stick reading, rounding toward zero.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub const fn apply(self, value: i8) -> i8 {
        ((value as i16 * self.0 as i16) / 100) as i8
    }
}

impl Default for TurnAttenuation {
    fn default() -> Self {
        Self::percent(TURN_ATTENUATION_PERCENT)
    }
}

/// Drive loop tuning.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DriveConfig {
    pub turn_attenuation: TurnAttenuation,
    /// Stick readings with magnitude at or below this value are treated as zero.
    pub deadband: u8,
}

impl DriveConfig {
    pub const fn new(turn_attenuation: TurnAttenuation, deadband: u8) -> Self {
        Self {
            turn_attenuation,
            deadband,
        }
    }
}

/// Intake tuning.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IntakeConfig {
    pub power: MotorPower,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            power: INTAKE_POWER,
        }
    }
}

/// What the arm does on the tick a jog level drops.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JogRelease {
    /// Re-issue the last commanded setpoint so closed-loop holding resumes there.
    ResumeSetpoint,
    /// Brake in place wherever the jog left the arm.
    Brake,
}

/// Arm calibration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArmConfig {
    pub stowed: Degrees,
    pub deployed: Degrees,
    pub max_speed: u8,
    pub jog_power: MotorPower,
    pub jog_release: JogRelease,
}

impl ArmConfig {
    pub const fn new(stowed: Degrees, deployed: Degrees) -> Self {
        Self {
            stowed,
            deployed,
            max_speed: ARM_MAX_SPEED,
            jog_power: ARM_JOG_POWER,
            jog_release: JogRelease::ResumeSetpoint,
        }
    }

    #[must_use]
    pub const fn with_jog_release(mut self, jog_release: JogRelease) -> Self {
        self.jog_release = jog_release;
        self
    }
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self::new(ARM_STOWED, ARM_DEPLOYED)
    }
}

/// Complete driver-control configuration.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TeleopConfig {
    pub periods: LoopPeriods,
    pub drive: DriveConfig,
    pub intake: IntakeConfig,
    pub arm: ArmConfig,
}
