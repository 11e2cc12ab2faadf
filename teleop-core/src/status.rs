//! Operator-facing status snapshot.
//!
//! Rendered on the controller screen, so the compact form must fit a
//! 19-column line: `CLP:C INT:F ARM:D` plus a one-character marker, `*`
//! while a press is waiting for release and `-` while driver control is off.

use core::fmt;

use crate::arm::{ArmState, JogState};
use crate::clamp::ClampState;
use crate::input::ButtonId;
use crate::intake::IntakeState;

/// Width of one controller screen line.
pub const STATUS_LINE_COLUMNS: usize = 19;

/// Point-in-time copy of the input loop's logical state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub clamp: ClampState,
    pub intake: IntakeState,
    pub arm: ArmState,
    pub awaiting: Option<ButtonId>,
    pub running: bool,
}

impl StatusSnapshot {
    const fn clamp_code(&self) -> char {
        match self.clamp {
            ClampState::Open => 'O',
            ClampState::Closed => 'C',
        }
    }

    const fn intake_code(&self) -> char {
        match self.intake {
            IntakeState::Idle => '-',
            IntakeState::RunningForward => 'F',
            IntakeState::RunningReverse => 'R',
        }
    }

    const fn arm_code(&self) -> char {
        match (self.arm.active, self.arm.jog) {
            (true, JogState::Jogging(_)) => 'J',
            (true, JogState::Holding) => 'D',
            (false, _) => 'S',
        }
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CLP:{} INT:{} ARM:{}",
            self.clamp_code(),
            self.intake_code(),
            self.arm_code()
        )?;
        if !self.running {
            f.write_str(" -")
        } else if self.awaiting.is_some() {
            f.write_str(" *")
        } else {
            Ok(())
        }
    }
}
