//! Telemetry ring buffer and logging helpers.
//!
//! Keeps the most recent driver-control events with timestamps and mirrors
//! each one to defmt on the MCU or stdout on the host, so bring-up sessions
//! and post-match dumps see the same stream.

use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;
use heapless::HistoryBuf;
use teleop_core::actuator::ActuatorFault;
use teleop_core::teleop::{TeleopEvent, TickReport};

use crate::link::FrameError;
use crate::mode::CompetitionMode;
use crate::sync::FirmwareMutex;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Monotonic record identifier.
pub type EventId = u32;

/// Everything the firmware records.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEvent {
    Teleop(TeleopEvent),
    DriveFault(ActuatorFault),
    Mode(CompetitionMode),
    ControllerLink { connected: bool },
    FrameDropped(FrameError),
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEvent::Teleop(event) => write!(f, "teleop {event}"),
            TelemetryEvent::DriveFault(fault) => write!(f, "drive fault: {fault}"),
            TelemetryEvent::Mode(mode) => write!(f, "mode {mode}"),
            TelemetryEvent::ControllerLink { connected: true } => f.write_str("controller connected"),
            TelemetryEvent::ControllerLink { connected: false } => {
                f.write_str("controller disconnected")
            }
            TelemetryEvent::FrameDropped(error) => write!(f, "frame dropped: {error}"),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Instant,
    pub event: TelemetryEvent,
}

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryRecorder {
    ring: HistoryBuf<TelemetryRecord, TELEMETRY_RING_CAPACITY>,
    next_event_id: EventId,
}

impl TelemetryRecorder {
    /// Creates a new telemetry recorder with an empty history.
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.ring.oldest_ordered()
    }

    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Records one event and mirrors it to the log.
    pub fn record(&mut self, event: TelemetryEvent, timestamp: Instant) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });
        emit_log(&event, timestamp.as_micros());
        id
    }

    /// Records every event of an input tick.
    pub fn record_report(&mut self, report: &TickReport, timestamp: Instant) {
        for event in report.events() {
            self.record(TelemetryEvent::Teleop(*event), timestamp);
        }
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Recorder shared between tasks on the same executor.
pub struct SharedTelemetry {
    inner: Mutex<FirmwareMutex, RefCell<TelemetryRecorder>>,
}

impl SharedTelemetry {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(TelemetryRecorder::new())),
        }
    }

    pub fn record(&self, event: TelemetryEvent, timestamp: Instant) -> EventId {
        self.inner
            .lock(|recorder| recorder.borrow_mut().record(event, timestamp))
    }

    pub fn record_report(&self, report: &TickReport, timestamp: Instant) {
        if report.is_empty() {
            return;
        }
        self.inner
            .lock(|recorder| recorder.borrow_mut().record_report(report, timestamp));
    }

    /// Runs `f` against the recorder, for dumps and tests.
    pub fn with<R>(&self, f: impl FnOnce(&TelemetryRecorder) -> R) -> R {
        self.inner.lock(|recorder| f(&recorder.borrow()))
    }
}

impl Default for SharedTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "none")]
fn emit_log(event: &TelemetryEvent, timestamp_us: u64) {
    match event {
        TelemetryEvent::Teleop(TeleopEvent::Faulted(..))
        | TelemetryEvent::DriveFault(_)
        | TelemetryEvent::FrameDropped(_) => {
            defmt::warn!(
                "telemetry: {} t={}us",
                defmt::Display2Format(event),
                timestamp_us
            );
        }
        _ => defmt::info!(
            "telemetry: {} t={}us",
            defmt::Display2Format(event),
            timestamp_us
        ),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_log(event: &TelemetryEvent, timestamp_us: u64) {
    println!("telemetry: {event} t={timestamp_us}us");
}
