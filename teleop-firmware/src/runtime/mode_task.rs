use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Instant, Ticker};

use super::{GATE, TELEMETRY};
use crate::mode::ModeTracker;
use crate::telemetry::TelemetryEvent;

const MODE_SAMPLE_PERIOD: Duration = Duration::from_millis(20);

#[embassy_executor::task]
pub async fn run(enable: Input<'static>, autonomous: Input<'static>) -> ! {
    let mut tracker = ModeTracker::new();
    let mut ticker = Ticker::every(MODE_SAMPLE_PERIOD);

    loop {
        ticker.next().await;
        let Some(change) = tracker.sample(enable.is_high(), autonomous.is_high()) else {
            continue;
        };

        TELEMETRY.record(TelemetryEvent::Mode(change.to), Instant::now());
        if let Some(action) = change.gate_action() {
            GATE.apply(action);
        }
    }
}
