//! Deterministic cooperative scheduler for the two driver-control loops.
//!
//! Host tests and the emulator drive this with virtual time. Each loop keeps
//! its own fixed-rate deadline; a long button hold only parks the input loop
//! in its awaiting-release phase and never moves a drive deadline.

use core::ops::Add;
use core::time::Duration;

use crate::actuator::{ActuatorFault, ActuatorOutput};
use crate::config::{LoopPeriods, TeleopConfig};
use crate::drive::{DriveCommandLoop, DriveReport, DrivetrainOutput};
use crate::input::ControllerInput;
use crate::status::StatusSnapshot;
use crate::teleop::{TeleopInputLoop, TickReport};

/// Which periodic loop a tick belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopKind {
    Input,
    Drive,
}

/// Result of one scheduled tick.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScheduledTick {
    Input(TickReport),
    Drive(DriveReport),
}

impl ScheduledTick {
    pub const fn kind(&self) -> LoopKind {
        match self {
            ScheduledTick::Input(_) => LoopKind::Input,
            ScheduledTick::Drive(_) => LoopKind::Drive,
        }
    }
}

/// What a stop commanded on the way out.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StopReport {
    pub input: TickReport,
    pub drive_fault: Option<ActuatorFault>,
}

/// What a start did, including the stop of a period that was still running.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StartReport {
    pub stopped: Option<StopReport>,
    pub input: TickReport,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Lifecycle<I> {
    Stopped,
    Running { next_input: I, next_drive: I },
}

/// Interleaves the input and drive loops at their periods over `I`.
#[derive(Clone, Debug)]
pub struct Scheduler<I> {
    input_loop: TeleopInputLoop,
    drive_loop: DriveCommandLoop,
    periods: LoopPeriods,
    lifecycle: Lifecycle<I>,
}

impl<I> Scheduler<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    #[must_use]
    pub const fn new(config: &TeleopConfig) -> Self {
        Self {
            input_loop: TeleopInputLoop::new(config),
            drive_loop: DriveCommandLoop::new(config.drive),
            periods: LoopPeriods::new(config.periods.input, config.periods.drive),
            lifecycle: Lifecycle::Stopped,
        }
    }

    pub const fn is_running(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Running { .. })
    }

    pub const fn periods(&self) -> LoopPeriods {
        self.periods
    }

    pub fn status(&self) -> StatusSnapshot {
        self.input_loop.status()
    }

    /// Begins a driver-control period; both loops tick first at `now`.
    ///
    /// A period still running is stopped first, so every actuator is in its
    /// safe state before the machines are reinitialized.
    pub fn start<A, D>(&mut self, now: I, actuators: &mut A, drivetrain: &mut D) -> StartReport
    where
        A: ActuatorOutput + ?Sized,
        D: DrivetrainOutput + ?Sized,
    {
        let stopped = self
            .is_running()
            .then(|| self.stop(actuators, drivetrain));
        self.lifecycle = Lifecycle::Running {
            next_input: now,
            next_drive: now,
        };
        StartReport {
            stopped,
            input: self.input_loop.start(),
        }
    }

    /// Ends the period and leaves every actuator in its safe state.
    pub fn stop<A, D>(&mut self, actuators: &mut A, drivetrain: &mut D) -> StopReport
    where
        A: ActuatorOutput + ?Sized,
        D: DrivetrainOutput + ?Sized,
    {
        if !self.is_running() {
            return StopReport::default();
        }
        self.lifecycle = Lifecycle::Stopped;
        StopReport {
            input: self.input_loop.stop(actuators),
            drive_fault: self.drive_loop.stop(drivetrain).err(),
        }
    }

    /// Earliest pending deadline, if running.
    pub fn next_deadline(&self) -> Option<I> {
        match self.lifecycle {
            Lifecycle::Stopped => None,
            Lifecycle::Running {
                next_input,
                next_drive,
            } => Some(next_input.min(next_drive)),
        }
    }

    /// Runs every tick due at or before `now`, in deadline order.
    ///
    /// When both loops share a deadline the drive tick goes first. `on_tick`
    /// sees each tick's deadline and report. Returns the number of ticks run.
    pub fn poll<C, A, D, F>(
        &mut self,
        now: I,
        input: &C,
        actuators: &mut A,
        drivetrain: &mut D,
        mut on_tick: F,
    ) -> usize
    where
        C: ControllerInput + ?Sized,
        A: ActuatorOutput + ?Sized,
        D: DrivetrainOutput + ?Sized,
        F: FnMut(I, ScheduledTick),
    {
        let mut ran = 0;
        while let Lifecycle::Running {
            next_input,
            next_drive,
        } = &mut self.lifecycle
        {
            let drive_due = *next_drive <= now;
            let input_due = *next_input <= now;

            if drive_due && (!input_due || *next_drive <= *next_input) {
                let deadline = *next_drive;
                *next_drive = deadline + self.periods.drive;
                let report = self.drive_loop.tick(input, drivetrain);
                on_tick(deadline, ScheduledTick::Drive(report));
            } else if input_due {
                let deadline = *next_input;
                *next_input = deadline + self.periods.input;
                let report = self.input_loop.tick(input, actuators);
                on_tick(deadline, ScheduledTick::Input(report));
            } else {
                break;
            }
            ran += 1;
        }
        ran
    }
}
