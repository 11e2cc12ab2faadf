//! Bounded hand-off between the control loops and the actuator link task.
//!
//! Loops never await the UART. Each command is pushed with `try_send`; a full
//! queue surfaces as [`ActuatorFault::QueueFull`] and the loop moves on. The
//! safe-state commands sent when a period ends go through [`SafeStateOutput`]
//! instead, which waits for room up to [`SAFE_STATE_TIMEOUT`].

use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use embassy_time::Duration;
use teleop_core::actuator::{ActuatorCommand, ActuatorFault, ActuatorOutput};
use teleop_core::drive::{DriveCommand, DrivetrainOutput};

use crate::link::LinkCommand;
use crate::sync::FirmwareMutex;

/// Depth of the outbound command queue.
pub const OUTPUT_QUEUE_DEPTH: usize = 8;

/// How long a stop waits for queue room per safe-state command.
pub const SAFE_STATE_TIMEOUT: Duration = Duration::from_millis(100);

/// Delivery that waits for queue room, for commands that must not be dropped.
#[allow(async_fn_in_trait)]
pub trait SafeStateOutput<C> {
    async fn deliver(&mut self, command: C) -> Result<(), ActuatorFault>;
}

pub type OutputChannel = Channel<FirmwareMutex, LinkCommand, OUTPUT_QUEUE_DEPTH>;
pub type OutputSender<'a> = Sender<'a, FirmwareMutex, LinkCommand, OUTPUT_QUEUE_DEPTH>;
pub type OutputReceiver<'a> = Receiver<'a, FirmwareMutex, LinkCommand, OUTPUT_QUEUE_DEPTH>;

/// Owns the outbound channel shared by the input and drive loops.
pub struct OutputQueue {
    channel: OutputChannel,
}

impl OutputQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Actuator capability for the input loop.
    pub fn actuators(&self) -> QueuedActuators<'_> {
        QueuedActuators {
            sender: self.channel.sender(),
        }
    }

    /// Drivetrain capability for the drive loop.
    pub fn drivetrain(&self) -> QueuedDrivetrain<'_> {
        QueuedDrivetrain {
            sender: self.channel.sender(),
        }
    }

    /// Consumer half for the actuator link task.
    pub fn receiver(&self) -> OutputReceiver<'_> {
        self.channel.receiver()
    }
}

impl Default for OutputQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn enqueue(sender: &OutputSender<'_>, command: LinkCommand) -> Result<(), ActuatorFault> {
    sender.try_send(command).map_err(|TrySendError::Full(_)| ActuatorFault::QueueFull)
}

#[cfg(target_os = "none")]
async fn enqueue_waiting(
    sender: &OutputSender<'_>,
    command: LinkCommand,
) -> Result<(), ActuatorFault> {
    embassy_time::with_timeout(SAFE_STATE_TIMEOUT, sender.send(command))
        .await
        .map_err(|_| ActuatorFault::QueueFull)
}

#[cfg(not(target_os = "none"))]
async fn enqueue_waiting(
    sender: &OutputSender<'_>,
    command: LinkCommand,
) -> Result<(), ActuatorFault> {
    sender.send(command).await;
    Ok(())
}

pub struct QueuedActuators<'a> {
    sender: OutputSender<'a>,
}

impl ActuatorOutput for QueuedActuators<'_> {
    fn apply(&mut self, command: ActuatorCommand) -> Result<(), ActuatorFault> {
        enqueue(&self.sender, LinkCommand::Actuator(command))
    }
}

impl SafeStateOutput<ActuatorCommand> for QueuedActuators<'_> {
    async fn deliver(&mut self, command: ActuatorCommand) -> Result<(), ActuatorFault> {
        enqueue_waiting(&self.sender, LinkCommand::Actuator(command)).await
    }
}

pub struct QueuedDrivetrain<'a> {
    sender: OutputSender<'a>,
}

impl DrivetrainOutput for QueuedDrivetrain<'_> {
    fn arcade_drive(&mut self, command: DriveCommand) -> Result<(), ActuatorFault> {
        enqueue(&self.sender, LinkCommand::Drive(command))
    }
}

impl SafeStateOutput<DriveCommand> for QueuedDrivetrain<'_> {
    async fn deliver(&mut self, command: DriveCommand) -> Result<(), ActuatorFault> {
        enqueue_waiting(&self.sender, LinkCommand::Drive(command)).await
    }
}
