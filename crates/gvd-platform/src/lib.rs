//! Platform abstraction layer.
//!
//! Command handlers never touch the host directly. They go through the
//! service traits defined here, which the Linux implementation backs with
//! `/proc`, `chrono` and `sh`.

mod services;

pub use services::{
    ConsoleLog, ExeInfo, LinuxPlatform, ShellService, SystemInfo, SystemService, TimeService,
};
