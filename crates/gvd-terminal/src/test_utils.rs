//! Shared test fixtures: fake platform services and a ready-made CLI.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone};
use gvd_platform::{ConsoleLog, ExeInfo, ShellService, SystemInfo, SystemService, TimeService};
use gvd_types::config::CliConfig;
use gvd_types::error::{GvdError, Result};

use crate::cli::Cli;
use crate::commands::{Services, standard_cli};

/// Fixed system snapshot for host "router1".
pub struct FakeSystem;

impl SystemService for FakeSystem {
    fn system_info(&self) -> Result<SystemInfo> {
        Ok(SystemInfo {
            hostname: "router1".into(),
            os_type: "Linux".into(),
            release: "6.1.0".into(),
            version: "#1 SMP".into(),
            machine: "x86_64".into(),
            uptime_secs: 90_061,
            total_mem_kb: 2048,
            process_count: 17,
            exe: Some(ExeInfo {
                path: PathBuf::from("/usr/bin/gvd"),
                modified: fixed_time(),
                owner: "build".into(),
            }),
        })
    }
}

/// A clock stopped at [`fixed_time`].
pub struct FakeClock;

impl TimeService for FakeClock {
    fn now(&self) -> Result<DateTime<Local>> {
        Ok(fixed_time())
    }
}

pub fn fixed_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
        .single()
        .unwrap_or_else(Local::now)
}

/// Records every command and echoes it back; fails on "false".
#[derive(Default)]
pub struct FakeShell {
    pub commands: Mutex<Vec<String>>,
}

impl ShellService for FakeShell {
    fn run(&self, command: &str) -> Result<String> {
        self.commands.lock().unwrap().push(command.to_string());
        if command == "false" {
            return Err(GvdError::Command("exit status 1".into()));
        }
        Ok(format!("ran {command}"))
    }
}

/// Counts flush and clear calls.
#[derive(Default)]
pub struct RecordingConsole {
    pub flushes: Mutex<usize>,
    pub clears: Mutex<usize>,
}

impl ConsoleLog for RecordingConsole {
    fn flush(&self) -> Result<()> {
        *self.flushes.lock().unwrap() += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.clears.lock().unwrap() += 1;
        Ok(())
    }
}

/// Handles to the fakes behind a [`Services`] bundle.
pub struct Fakes {
    pub shell: Arc<FakeShell>,
    pub console: Arc<RecordingConsole>,
    pub services: Services,
}

impl Fakes {
    pub fn new() -> Self {
        let shell = Arc::new(FakeShell::default());
        let console = Arc::new(RecordingConsole::default());
        let services = Services {
            system: Arc::new(FakeSystem),
            time: Arc::new(FakeClock),
            shell: Arc::clone(&shell) as Arc<dyn ShellService>,
            console: Arc::clone(&console) as Arc<dyn ConsoleLog>,
        };
        Self {
            shell,
            console,
            services,
        }
    }

    /// Standard CLI over these fakes with the default configuration.
    pub fn cli(&self) -> Cli {
        standard_cli(CliConfig::default(), &self.services).unwrap()
    }
}
