//! Async runners for the two driver-control loops.
//!
//! Each loop waits for its half of the [`DriverControlGate`] to open, runs
//! one tick per period from its [`TickSource`], and races every tick against
//! the gate's close signal. Closing the gate therefore stops both loops within
//! one period and leaves the actuators and drivetrain in their safe state.
//! Safe-state commands wait for queue room rather than being dropped.

use embassy_futures::select::{Either, select};
use embassy_sync::signal::Signal;
use embassy_time::Instant;
use heapless::Vec;
use teleop_core::actuator::{ActuatorCommand, ActuatorFault, ActuatorOutput};
use teleop_core::drive::{DriveCommand, DriveCommandLoop, DrivetrainOutput};
use teleop_core::teleop::{TeleopEvent, TeleopInputLoop};

use crate::mode::GateAction;
use crate::outputs::SafeStateOutput;
use crate::snapshot::SnapshotSource;
use crate::sync::FirmwareMutex;
use crate::telemetry::{SharedTelemetry, TelemetryEvent};

#[cfg(target_os = "none")]
mod ticker;
#[cfg(target_os = "none")]
pub use ticker::TickerSource;

/// Periodic wake-up source for a loop.
#[allow(async_fn_in_trait)]
pub trait TickSource {
    /// Current time on this source's clock.
    fn now(&self) -> Instant;

    /// Waits for the next period boundary and returns its time.
    async fn next(&mut self) -> Instant;

    /// Re-anchors the period at the current time.
    fn restart(&mut self);
}

/// Start/stop signal pair for one loop.
pub struct LoopGate {
    opened: Signal<FirmwareMutex, ()>,
    closed: Signal<FirmwareMutex, ()>,
}

impl LoopGate {
    pub const fn new() -> Self {
        Self {
            opened: Signal::new(),
            closed: Signal::new(),
        }
    }

    pub async fn wait_open(&self) {
        self.opened.wait().await;
    }

    pub async fn wait_closed(&self) {
        self.closed.wait().await;
    }

    fn open(&self) {
        self.closed.reset();
        self.opened.signal(());
    }

    fn close(&self) {
        self.opened.reset();
        self.closed.signal(());
    }
}

impl Default for LoopGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Gate for one driver-control period, shared by the mode task and both loops.
pub struct DriverControlGate {
    pub input: LoopGate,
    pub drive: LoopGate,
}

impl DriverControlGate {
    pub const fn new() -> Self {
        Self {
            input: LoopGate::new(),
            drive: LoopGate::new(),
        }
    }

    pub fn open(&self) {
        self.input.open();
        self.drive.open();
    }

    pub fn close(&self) {
        self.input.close();
        self.drive.close();
    }

    pub fn apply(&self, action: GateAction) {
        match action {
            GateAction::Open => self.open(),
            GateAction::Close => self.close(),
        }
    }
}

impl Default for DriverControlGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the commands a stop issues so they can be delivered with waiting.
#[derive(Default)]
struct StagedCommands {
    commands: Vec<ActuatorCommand, 4>,
}

impl ActuatorOutput for StagedCommands {
    fn apply(&mut self, command: ActuatorCommand) -> Result<(), ActuatorFault> {
        self.commands
            .push(command)
            .map_err(|_| ActuatorFault::QueueFull)
    }
}

/// Runs the input loop until its gate closes. Returns the number of ticks run.
pub async fn run_input_period<T, S, A>(
    gate: &LoopGate,
    ticks: &mut T,
    source: &S,
    teleop: &mut TeleopInputLoop,
    actuators: &mut A,
    telemetry: &SharedTelemetry,
) -> u32
where
    T: TickSource,
    S: SnapshotSource + ?Sized,
    A: ActuatorOutput + SafeStateOutput<ActuatorCommand> + ?Sized,
{
    telemetry.record_report(&teleop.start(), ticks.now());

    let mut count = 0;
    loop {
        match select(ticks.next(), gate.wait_closed()).await {
            Either::First(now) => {
                let snapshot = source.snapshot_at(now);
                let report = teleop.tick(&snapshot, actuators);
                telemetry.record_report(&report, now);
                count += 1;
            }
            Either::Second(()) => {
                let mut staged = StagedCommands::default();
                let report = teleop.stop(&mut staged);
                for command in staged.commands {
                    if let Err(fault) = actuators.deliver(command).await {
                        let event = TelemetryEvent::Teleop(TeleopEvent::Faulted(command, fault));
                        telemetry.record(event, ticks.now());
                    }
                }
                telemetry.record_report(&report, ticks.now());
                return count;
            }
        }
    }
}

/// Runs the drive loop until its gate closes. Returns the number of ticks run.
///
/// Drive faults are logged when they start and when they change, not on
/// every tick.
pub async fn run_drive_period<T, S, D>(
    gate: &LoopGate,
    ticks: &mut T,
    source: &S,
    drive: &DriveCommandLoop,
    drivetrain: &mut D,
    telemetry: &SharedTelemetry,
) -> u32
where
    T: TickSource,
    S: SnapshotSource + ?Sized,
    D: DrivetrainOutput + SafeStateOutput<DriveCommand> + ?Sized,
{
    let mut last_fault: Option<ActuatorFault> = None;
    let mut count = 0;
    loop {
        match select(ticks.next(), gate.wait_closed()).await {
            Either::First(now) => {
                let snapshot = source.snapshot_at(now);
                let report = drive.tick(&snapshot, drivetrain);
                if let Some(fault) = report.fault.filter(|fault| last_fault != Some(*fault)) {
                    telemetry.record(TelemetryEvent::DriveFault(fault), now);
                }
                last_fault = report.fault;
                count += 1;
            }
            Either::Second(()) => {
                if let Err(fault) = drivetrain.deliver(DriveCommand::neutral()).await {
                    telemetry.record(TelemetryEvent::DriveFault(fault), ticks.now());
                }
                return count;
            }
        }
    }
}

/// Input task body: one period per gate opening, forever.
pub async fn serve_input<T, S, A>(
    gate: &LoopGate,
    ticks: &mut T,
    source: &S,
    mut teleop: TeleopInputLoop,
    actuators: &mut A,
    telemetry: &SharedTelemetry,
) -> !
where
    T: TickSource,
    S: SnapshotSource + ?Sized,
    A: ActuatorOutput + SafeStateOutput<ActuatorCommand> + ?Sized,
{
    loop {
        gate.wait_open().await;
        ticks.restart();
        run_input_period(gate, ticks, source, &mut teleop, actuators, telemetry).await;
    }
}

/// Drive task body: one period per gate opening, forever.
pub async fn serve_drive<T, S, D>(
    gate: &LoopGate,
    ticks: &mut T,
    source: &S,
    drive: DriveCommandLoop,
    drivetrain: &mut D,
    telemetry: &SharedTelemetry,
) -> !
where
    T: TickSource,
    S: SnapshotSource + ?Sized,
    D: DrivetrainOutput + SafeStateOutput<DriveCommand> + ?Sized,
{
    loop {
        gate.wait_open().await;
        ticks.restart();
        run_drive_period(gate, ticks, source, &drive, drivetrain, telemetry).await;
    }
}
