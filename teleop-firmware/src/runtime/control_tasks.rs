use teleop_core::config::TeleopConfig;
use teleop_core::drive::DriveCommandLoop;
use teleop_core::teleop::TeleopInputLoop;

use super::{GATE, OUTPUTS, SNAPSHOT, TELEMETRY};
use crate::driver::{TickerSource, serve_drive, serve_input};

#[embassy_executor::task]
pub async fn input(config: TeleopConfig) -> ! {
    let mut ticks = TickerSource::new(config.periods.input);
    let mut actuators = OUTPUTS.actuators();
    defmt::info!("input loop: period={}ms", ticks.period().as_millis());

    serve_input(
        &GATE.input,
        &mut ticks,
        &SNAPSHOT,
        TeleopInputLoop::new(&config),
        &mut actuators,
        &TELEMETRY,
    )
    .await
}

#[embassy_executor::task]
pub async fn drive(config: TeleopConfig) -> ! {
    let mut ticks = TickerSource::new(config.periods.drive);
    let mut drivetrain = OUTPUTS.drivetrain();
    defmt::info!("drive loop: period={}ms", ticks.period().as_millis());

    serve_drive(
        &GATE.drive,
        &mut ticks,
        &SNAPSHOT,
        DriveCommandLoop::new(config.drive),
        &mut drivetrain,
        &TELEMETRY,
    )
    .await
}
