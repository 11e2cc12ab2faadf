//! Shared controller snapshot written by the radio link and read by both loops.
//!
//! The whole snapshot is packed into one atomic word so a reader can never
//! observe buttons from one frame and axes from another. Readers take a copy
//! stamped with their tick time; once no valid frame has arrived for
//! [`LINK_TIMEOUT`] the copy reads neutral.

use embassy_time::{Duration, Instant};
use portable_atomic::{AtomicU32, AtomicU64, Ordering};
use teleop_core::input::ControllerSnapshot;

/// Link silence after which the controller counts as disconnected.
pub const LINK_TIMEOUT: Duration = Duration::from_millis(250);

/// Zero marks "never received".
const NEVER: u64 = 0;

/// Source of point-in-time controller copies for the loop runners.
pub trait SnapshotSource {
    fn snapshot_at(&self, now: Instant) -> ControllerSnapshot;
}

/// Lock-free single-writer store for the latest controller frame.
pub struct SharedSnapshot {
    packed: AtomicU32,
    /// Receive time in microseconds, plus one.
    received_at: AtomicU64,
}

impl SharedSnapshot {
    pub const fn new() -> Self {
        Self {
            packed: AtomicU32::new(0),
            received_at: AtomicU64::new(NEVER),
        }
    }

    /// Stores a freshly decoded frame.
    pub fn publish(&self, snapshot: &ControllerSnapshot, at: Instant) {
        self.packed.store(pack(snapshot), Ordering::Relaxed);
        self.received_at
            .store(at.as_micros().saturating_add(1), Ordering::Release);
    }

    /// Age of the latest frame, or `None` if nothing has arrived yet.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        match self.received_at.load(Ordering::Acquire) {
            NEVER => None,
            raw => Some(now.saturating_duration_since(Instant::from_micros(raw - 1))),
        }
    }

    pub fn is_connected(&self, now: Instant) -> bool {
        self.age(now).is_some_and(|age| age <= LINK_TIMEOUT)
    }

    /// Forgets the latest frame so readers fall back to neutral immediately.
    pub fn clear(&self) {
        self.received_at.store(NEVER, Ordering::Release);
        self.packed.store(0, Ordering::Relaxed);
    }
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for SharedSnapshot {
    fn snapshot_at(&self, now: Instant) -> ControllerSnapshot {
        if self.is_connected(now) {
            unpack(self.packed.load(Ordering::Relaxed))
        } else {
            ControllerSnapshot::neutral()
        }
    }
}

/// Reports controller-link connect and disconnect transitions once each.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LinkMonitor {
    connected: bool,
}

impl LinkMonitor {
    pub const fn new() -> Self {
        Self { connected: false }
    }

    /// Returns the new state when it differs from the last one seen.
    pub fn update(&mut self, connected: bool) -> Option<bool> {
        if connected == self.connected {
            return None;
        }
        self.connected = connected;
        Some(connected)
    }
}

fn pack(snapshot: &ControllerSnapshot) -> u32 {
    use teleop_core::input::AxisId;

    let forward = snapshot.axis(AxisId::Forward).to_le_bytes()[0];
    let turn = snapshot.axis(AxisId::Turn).to_le_bytes()[0];
    u32::from_le_bytes([snapshot.buttons(), forward, turn, 0])
}

fn unpack(raw: u32) -> ControllerSnapshot {
    let [buttons, forward, turn, _] = raw.to_le_bytes();
    ControllerSnapshot::from_raw(
        buttons,
        i8::from_le_bytes([forward]),
        i8::from_le_bytes([turn]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use teleop_core::input::{AxisId, ButtonId};

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn reads_neutral_until_first_frame() {
        let store = SharedSnapshot::new();
        assert_eq!(store.snapshot_at(at(10)), ControllerSnapshot::neutral());
        assert!(!store.is_connected(at(10)));
        assert_eq!(store.age(at(10)), None);
    }

    #[test]
    fn copies_latest_frame_while_fresh() {
        let store = SharedSnapshot::new();
        let frame = ControllerSnapshot::neutral()
            .with_button(ButtonId::ArmJogDown, true)
            .with_axis(AxisId::Turn, -127)
            .with_axis(AxisId::Forward, 33);
        store.publish(&frame, at(1_000));

        assert_eq!(store.snapshot_at(at(1_000)), frame);
        assert_eq!(store.snapshot_at(at(1_250)), frame);
        assert_eq!(store.age(at(1_100)), Some(Duration::from_millis(100)));
    }

    #[test]
    fn stale_link_reads_neutral() {
        let store = SharedSnapshot::new();
        let frame = ControllerSnapshot::neutral().with_button(ButtonId::ClampToggle, true);
        store.publish(&frame, at(0));

        assert_eq!(store.snapshot_at(at(251)), ControllerSnapshot::neutral());

        store.publish(&frame, at(300));
        assert_eq!(store.snapshot_at(at(301)), frame);

        store.clear();
        assert_eq!(store.snapshot_at(at(301)), ControllerSnapshot::neutral());
    }

    #[test]
    fn link_monitor_reports_edges_only() {
        let mut monitor = LinkMonitor::new();
        assert_eq!(monitor.update(false), None);
        assert_eq!(monitor.update(true), Some(true));
        assert_eq!(monitor.update(true), None);
        assert_eq!(monitor.update(false), Some(false));
    }
}
