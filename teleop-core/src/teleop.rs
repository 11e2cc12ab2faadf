//! Teleop input loop body: edge detection feeding the three actuator machines.
//!
//! Buttons are observed in a fixed order: clamp, intake, arm toggle, then the
//! jog levels. The first press that changes an actuator ends the tick and the
//! loop enters [`LoopPhase::AwaitingRelease`] for that button. While waiting,
//! no other edge is observed, so their detectors keep whatever armed state
//! they had and a press made during the hold fires on the first tick after
//! the release. Jog levels are still read every tick: a jog released during
//! the hold stops the arm on that tick. The drive loop never waits on any of
//! this.

use core::fmt;

use heapless::Vec;

use crate::actuator::{ActuatorCommand, ActuatorFault, ActuatorOutput};
use crate::arm::ArmMachine;
use crate::clamp::ClampMachine;
use crate::config::TeleopConfig;
use crate::edge::EdgeBank;
use crate::input::{ButtonId, ControllerInput};
use crate::intake::IntakeMachine;
use crate::status::StatusSnapshot;

/// Upper bound on events produced by a single tick or stop.
pub const MAX_TICK_EVENTS: usize = 8;

/// Structured record of what the input loop did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TeleopEvent {
    Started,
    Stopped,
    /// A press event reached an actuator machine.
    Pressed(ButtonId),
    /// The button the loop was waiting on read released.
    Released(ButtonId),
    Commanded(ActuatorCommand),
    Faulted(ActuatorCommand, ActuatorFault),
}

impl fmt::Display for TeleopEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeleopEvent::Started => f.write_str("started"),
            TeleopEvent::Stopped => f.write_str("stopped"),
            TeleopEvent::Pressed(button) => write!(f, "press {button}"),
            TeleopEvent::Released(button) => write!(f, "release {button}"),
            TeleopEvent::Commanded(command) => write!(f, "command {command}"),
            TeleopEvent::Faulted(command, fault) => write!(f, "fault {command}: {fault}"),
        }
    }
}

/// Input loop phase.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LoopPhase {
    #[default]
    Idle,
    Running,
    /// A press was handled; nothing else is read until this button is released.
    AwaitingRelease(ButtonId),
}

/// Everything one tick (or a stop) did, in order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickReport {
    events: Vec<TeleopEvent, MAX_TICK_EVENTS>,
    awaiting: Option<ButtonId>,
}

impl TickReport {
    pub fn events(&self) -> &[TeleopEvent] {
        &self.events
    }

    /// Button the loop is still waiting on after this tick.
    pub const fn awaiting(&self) -> Option<ButtonId> {
        self.awaiting
    }

    /// Commands that were handed to the actuator collaborator, faulted or not.
    pub fn commands(&self) -> impl Iterator<Item = ActuatorCommand> + '_ {
        self.events.iter().filter_map(|event| match *event {
            TeleopEvent::Commanded(command) | TeleopEvent::Faulted(command, _) => Some(command),
            _ => None,
        })
    }

    pub fn faults(&self) -> impl Iterator<Item = (ActuatorCommand, ActuatorFault)> + '_ {
        self.events.iter().filter_map(|event| match *event {
            TeleopEvent::Faulted(command, fault) => Some((command, fault)),
            _ => None,
        })
    }

    pub fn pressed(&self) -> Option<ButtonId> {
        self.events.iter().find_map(|event| match *event {
            TeleopEvent::Pressed(button) => Some(button),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn record(&mut self, event: TeleopEvent) {
        // Capacity covers the worst case of a release, a press and a command.
        let _ = self.events.push(event);
    }
}

/// Owns the edge detectors and actuator machines for one driver-control period.
#[derive(Clone, Debug)]
pub struct TeleopInputLoop {
    edges: EdgeBank,
    clamp: ClampMachine,
    intake: IntakeMachine,
    arm: ArmMachine,
    phase: LoopPhase,
}

impl TeleopInputLoop {
    #[must_use]
    pub const fn new(config: &TeleopConfig) -> Self {
        Self {
            edges: EdgeBank::new(),
            clamp: ClampMachine::new(),
            intake: IntakeMachine::new(config.intake),
            arm: ArmMachine::new(config.arm),
            phase: LoopPhase::Idle,
        }
    }

    pub const fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub const fn is_running(&self) -> bool {
        !matches!(self.phase, LoopPhase::Idle)
    }

    /// Reinitializes every detector and machine and begins a new period.
    pub fn start(&mut self) -> TickReport {
        self.edges.reset();
        self.clamp.reset();
        self.intake.reset();
        self.arm.reset();
        self.phase = LoopPhase::Running;

        let mut report = TickReport::default();
        report.record(TeleopEvent::Started);
        report
    }

    /// Ends the period, commanding intake and arm to a safe state.
    pub fn stop<A>(&mut self, actuators: &mut A) -> TickReport
    where
        A: ActuatorOutput + ?Sized,
    {
        let mut report = TickReport::default();
        if !self.is_running() {
            return report;
        }

        issue(actuators, self.intake.safe_command(), &mut report);
        issue(actuators, self.arm.safe_command(), &mut report);
        self.phase = LoopPhase::Idle;
        report.record(TeleopEvent::Stopped);
        report
    }

    /// Runs one input tick. Does nothing while stopped.
    pub fn tick<C, A>(&mut self, input: &C, actuators: &mut A) -> TickReport
    where
        C: ControllerInput + ?Sized,
        A: ActuatorOutput + ?Sized,
    {
        let mut report = TickReport::default();
        match self.phase {
            LoopPhase::Idle => return report,
            LoopPhase::Running => {}
            LoopPhase::AwaitingRelease(button) => {
                let held = input.read_digital(button);
                self.edges.observe_level(button, held);
                if held {
                    self.apply_jog(input, actuators, &mut report);
                    report.awaiting = Some(button);
                    return report;
                }
                self.phase = LoopPhase::Running;
                report.record(TeleopEvent::Released(button));
            }
        }

        if let Some(button) = self.poll_presses(input, actuators, &mut report) {
            self.phase = LoopPhase::AwaitingRelease(button);
            report.awaiting = Some(button);
            return report;
        }

        self.apply_jog(input, actuators, &mut report);
        report
    }

    /// Copy of the current logical state.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            clamp: self.clamp.state(),
            intake: self.intake.state(),
            arm: self.arm.state(),
            awaiting: match self.phase {
                LoopPhase::AwaitingRelease(button) => Some(button),
                _ => None,
            },
            running: self.is_running(),
        }
    }

    fn apply_jog<C, A>(&mut self, input: &C, actuators: &mut A, report: &mut TickReport)
    where
        C: ControllerInput + ?Sized,
        A: ActuatorOutput + ?Sized,
    {
        let up = input.read_digital(ButtonId::ArmJogUp);
        let down = input.read_digital(ButtonId::ArmJogDown);
        if let Some(command) = self.arm.on_jog_levels(up, down) {
            issue(actuators, command, report);
        }
    }

    /// Observes edge-triggered buttons in order and handles the first press.
    fn poll_presses<C, A>(
        &mut self,
        input: &C,
        actuators: &mut A,
        report: &mut TickReport,
    ) -> Option<ButtonId>
    where
        C: ControllerInput + ?Sized,
        A: ActuatorOutput + ?Sized,
    {
        if self.edges.observe(input, ButtonId::ClampToggle).is_some() {
            report.record(TeleopEvent::Pressed(ButtonId::ClampToggle));
            issue(actuators, self.clamp.on_press(), report);
            return Some(ButtonId::ClampToggle);
        }

        let forward = self.edges.observe(input, ButtonId::IntakeForward).is_some();
        let reverse = self.edges.observe(input, ButtonId::IntakeReverse).is_some();
        if let Some((direction, command)) = self.intake.on_presses(forward, reverse) {
            report.record(TeleopEvent::Pressed(direction.button()));
            issue(actuators, command, report);
            return Some(direction.button());
        }

        if self.edges.observe(input, ButtonId::ArmToggle).is_some() {
            report.record(TeleopEvent::Pressed(ButtonId::ArmToggle));
            issue(actuators, self.arm.on_toggle(), report);
            return Some(ButtonId::ArmToggle);
        }

        None
    }
}

impl Default for TeleopInputLoop {
    fn default() -> Self {
        Self::new(&TeleopConfig::default())
    }
}

fn issue<A>(actuators: &mut A, command: ActuatorCommand, report: &mut TickReport)
where
    A: ActuatorOutput + ?Sized,
{
    match actuators.apply(command) {
        Ok(()) => report.record(TeleopEvent::Commanded(command)),
        Err(fault) => report.record(TeleopEvent::Faulted(command, fault)),
    }
}
