#![no_std]

// Driver-control logic for the competition robot.
//
// Everything here is portable across the MCU firmware and host tooling: no
// allocation, no executor, no logging. Hardware is reached only through the
// capability traits in `input`, `actuator` and `drive`.

pub mod actuator;
pub mod arm;
pub mod clamp;
pub mod config;
pub mod drive;
pub mod edge;
pub mod input;
pub mod intake;
pub mod schedule;
pub mod status;
pub mod teleop;
