use embassy_futures::join::join;
use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_time::{Duration, Instant, Timer, with_timeout};
use embedded_io_async::{Read, Write};
use static_cell::StaticCell;

use super::{OUTPUTS, SNAPSHOT, TELEMETRY};
use crate::link::{ACTUATOR_FRAME_SIZE, CONTROLLER_FRAME_SIZE, ControllerFrameDecoder};
use crate::outputs::OUTPUT_QUEUE_DEPTH;
use crate::snapshot::{LINK_TIMEOUT, LinkMonitor};
use crate::telemetry::TelemetryEvent;

const LINK_UART_BAUD: u32 = 115_200;
const UART_TX_BUFFER_SIZE: usize = ACTUATOR_FRAME_SIZE * OUTPUT_QUEUE_DEPTH;
const UART_RX_BUFFER_SIZE: usize = CONTROLLER_FRAME_SIZE * 8;

static UART_TX_BUFFER: StaticCell<[u8; UART_TX_BUFFER_SIZE]> = StaticCell::new();
static UART_RX_BUFFER: StaticCell<[u8; UART_RX_BUFFER_SIZE]> = StaticCell::new();

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART3_4_5_6_LPUART1 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART5>;
});

/// Full-duplex link: controller frames arrive on RX, actuator frames leave on TX.
#[embassy_executor::task]
pub async fn run(
    usart: Peri<'static, hal::peripherals::USART5>,
    tx_pin: Peri<'static, hal::peripherals::PB0>,
    rx_pin: Peri<'static, hal::peripherals::PB1>,
) -> ! {
    let mut config = UartConfig::default();
    config.baudrate = LINK_UART_BAUD;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP1;
    config.parity = Parity::ParityNone;

    let uart = BufferedUart::new(
        usart,
        rx_pin,
        tx_pin,
        UART_TX_BUFFER.init([0; UART_TX_BUFFER_SIZE]),
        UART_RX_BUFFER.init([0; UART_RX_BUFFER_SIZE]),
        UartIrqs,
        config,
    )
    .expect("failed to initialize link UART");

    let (mut uart_tx, mut uart_rx) = uart.split();
    let outbound = OUTPUTS.receiver();

    let to_board = async move {
        loop {
            let command = outbound.receive().await;
            let frame = command.encode();

            if uart_tx.write_all(&frame).await.is_err() {
                defmt::warn!("link: UART write error");
                Timer::after(Duration::from_millis(5)).await;
                continue;
            }
            if uart_tx.flush().await.is_err() {
                defmt::warn!("link: UART flush error");
            }
        }
    };

    let from_radio = async move {
        let mut decoder = ControllerFrameDecoder::new();
        let mut monitor = LinkMonitor::new();
        let mut ingress = [0u8; CONTROLLER_FRAME_SIZE * 2];

        loop {
            match with_timeout(LINK_TIMEOUT, uart_rx.read(&mut ingress)).await {
                Ok(Ok(count)) => {
                    let now = Instant::now();
                    decoder.extend(&ingress[..count], |frame| match frame {
                        Ok(snapshot) => SNAPSHOT.publish(&snapshot, now),
                        Err(error) => {
                            TELEMETRY.record(TelemetryEvent::FrameDropped(error), now);
                        }
                    });
                }
                Ok(Err(_)) => {
                    defmt::warn!("link: UART read error");
                    Timer::after(Duration::from_millis(5)).await;
                }
                Err(_) => {}
            }

            let now = Instant::now();
            if let Some(connected) = monitor.update(SNAPSHOT.is_connected(now)) {
                TELEMETRY.record(TelemetryEvent::ControllerLink { connected }, now);
            }
        }
    };

    join(to_board, from_radio).await;
    loop {
        core::future::pending::<()>().await;
    }
}
