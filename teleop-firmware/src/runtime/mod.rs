use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Pull};
use teleop_core::config::TeleopConfig;

use crate::driver::DriverControlGate;
use crate::outputs::OutputQueue;
use crate::snapshot::SharedSnapshot;
use crate::telemetry::SharedTelemetry;

mod control_tasks;
mod link_task;
mod mode_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static SNAPSHOT: SharedSnapshot = SharedSnapshot::new();
pub(super) static OUTPUTS: OutputQueue = OutputQueue::new();
pub(super) static GATE: DriverControlGate = DriverControlGate::new();
pub(super) static TELEMETRY: SharedTelemetry = SharedTelemetry::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal::Peripherals {
        PA0,
        PA1,
        PB0,
        PB1,
        USART5,
        ..
    } = hal::init(hal::Config::default());

    let config = TeleopConfig::default();

    spawner
        .spawn(link_task::run(USART5, PB0, PB1))
        .expect("failed to spawn link task");

    spawner
        .spawn(control_tasks::input(config))
        .expect("failed to spawn input loop task");

    spawner
        .spawn(control_tasks::drive(config))
        .expect("failed to spawn drive loop task");

    spawner
        .spawn(mode_task::run(
            Input::new(PA0, Pull::Down),
            Input::new(PA1, Pull::Down),
        ))
        .expect("failed to spawn mode task");

    core::future::pending::<()>().await;
}
