//! Raw mutex selection shared by every channel, signal and lock in the firmware.

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;

#[cfg(target_os = "none")]
pub type FirmwareMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
pub type FirmwareMutex = NoopRawMutex;
