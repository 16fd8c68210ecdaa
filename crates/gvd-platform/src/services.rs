//! Platform service traits and Linux implementation.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};
use gvd_types::error::{GvdError, Result};

// ---------------------------------------------------------------------------
// System service
// ---------------------------------------------------------------------------

/// Where the running binary lives and who built it.
#[derive(Debug, Clone)]
pub struct ExeInfo {
    /// Resolved path of the running executable.
    pub path: PathBuf,
    /// Modification time of the executable, used as the build time.
    pub modified: DateTime<Local>,
    /// Login name owning the executable, or the numeric uid if unknown.
    pub owner: String,
}

/// Snapshot of host identity and load.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub hostname: String,
    /// Kernel name, e.g. "Linux".
    pub os_type: String,
    /// Kernel release, e.g. "6.8.0".
    pub release: String,
    /// Kernel build string.
    pub version: String,
    /// Hardware architecture.
    pub machine: String,
    pub uptime_secs: u64,
    pub total_mem_kb: u64,
    pub process_count: usize,
    /// `None` when the executable cannot be inspected.
    pub exe: Option<ExeInfo>,
}

/// Abstraction over host identity queries.
pub trait SystemService: Send + Sync {
    /// Query the current system snapshot.
    fn system_info(&self) -> Result<SystemInfo>;

    /// Host name for the prompt.
    fn hostname(&self) -> Result<String> {
        Ok(self.system_info()?.hostname)
    }
}

// ---------------------------------------------------------------------------
// Time service
// ---------------------------------------------------------------------------

/// Abstraction over the wall clock.
pub trait TimeService: Send + Sync {
    /// Current local time.
    fn now(&self) -> Result<DateTime<Local>>;
}

// ---------------------------------------------------------------------------
// Shell service
// ---------------------------------------------------------------------------

/// Runs one-shot commands in the host shell.
pub trait ShellService: Send + Sync {
    /// Run `command` and return its combined stdout and stderr.
    fn run(&self, command: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Console log
// ---------------------------------------------------------------------------

/// Persistent record of the console session.
pub trait ConsoleLog: Send + Sync {
    /// Write every retained console line to the log file.
    fn flush(&self) -> Result<()>;

    /// Truncate the log file.
    fn clear(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Linux implementation
// ---------------------------------------------------------------------------

/// Platform implementation reading `/proc` and spawning `sh -c`.
pub struct LinuxPlatform {
    proc_root: PathBuf,
}

impl LinuxPlatform {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    /// Read system data from an alternate procfs mount.
    pub fn with_proc_root(root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: root.into(),
        }
    }

    fn read_proc(&self, rel: &str) -> Result<String> {
        let path = self.proc_root.join(rel);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            GvdError::Platform(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(text.trim().to_string())
    }

    fn uptime_secs(&self) -> Result<u64> {
        let text = self.read_proc("uptime")?;
        parse_uptime(&text)
            .ok_or_else(|| GvdError::Platform(format!("malformed uptime: {text}")))
    }

    fn total_mem_kb(&self) -> Result<u64> {
        let text = self.read_proc("meminfo")?;
        parse_mem_total(&text)
            .ok_or_else(|| GvdError::Platform("MemTotal missing from meminfo".into()))
    }

    fn process_count(&self) -> usize {
        std::fs::read_dir(&self.proc_root)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.file_name()
                            .to_str()
                            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
                    })
                    .count()
            })
            .unwrap_or(0)
    }

    fn exe_info(&self) -> Option<ExeInfo> {
        let path = std::fs::read_link(self.proc_root.join("self/exe")).ok()?;
        let meta = std::fs::metadata(&path).ok()?;
        let modified: DateTime<Local> = meta.modified().ok()?.into();
        Some(ExeInfo {
            owner: owner_name(&meta),
            path,
            modified,
        })
    }
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemService for LinuxPlatform {
    fn system_info(&self) -> Result<SystemInfo> {
        let exe = self.exe_info();
        if exe.is_none() {
            log::debug!("executable info unavailable");
        }
        Ok(SystemInfo {
            hostname: self.read_proc("sys/kernel/hostname")?,
            os_type: self.read_proc("sys/kernel/ostype")?,
            release: self.read_proc("sys/kernel/osrelease")?,
            version: self.read_proc("sys/kernel/version")?,
            machine: std::env::consts::ARCH.to_string(),
            uptime_secs: self.uptime_secs()?,
            total_mem_kb: self.total_mem_kb()?,
            process_count: self.process_count(),
            exe,
        })
    }

    fn hostname(&self) -> Result<String> {
        self.read_proc("sys/kernel/hostname")
    }
}

impl TimeService for LinuxPlatform {
    fn now(&self) -> Result<DateTime<Local>> {
        Ok(Local::now())
    }
}

impl ShellService for LinuxPlatform {
    fn run(&self, command: &str) -> Result<String> {
        log::debug!("shell: {command}");
        let output = Command::new("sh").arg("-c").arg(command).output()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text.trim_end_matches('\n').to_string())
    }
}

// ---------------------------------------------------------------------------
// procfs parsing helpers
// ---------------------------------------------------------------------------

/// First field of `/proc/uptime`, truncated to whole seconds.
pub(crate) fn parse_uptime(text: &str) -> Option<u64> {
    let first = text.split_whitespace().next()?;
    let whole = first.split('.').next()?;
    whole.parse().ok()
}

/// `MemTotal:` line of `/proc/meminfo`, in kB.
pub(crate) fn parse_mem_total(text: &str) -> Option<u64> {
    text.lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
}

fn owner_name(meta: &std::fs::Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    let uid = meta.uid();
    lookup_user(Path::new("/etc/passwd"), uid).unwrap_or_else(|| uid.to_string())
}

/// Map a uid to a login name via a passwd-format file.
pub(crate) fn lookup_user(passwd: &Path, uid: u32) -> Option<String> {
    let text = std::fs::read_to_string(passwd).ok()?;
    text.lines().find_map(|line| {
        let mut fields = line.split(':');
        let name = fields.next()?;
        let entry_uid: u32 = fields.nth(1)?.parse().ok()?;
        (entry_uid == uid).then(|| name.to_string())
    })
}

// ---------------------------------------------------------------------------
// In-module tests
// ---------------------------------------------------------------------------
