//! System commands: quit, configure, show version/time, and the shell.

use std::fmt::Write;
use std::sync::Arc;

use gvd_platform::{ShellService, SystemInfo, SystemService, TimeService};
use gvd_types::error::Result;

use crate::cli::CliBuilder;
use crate::commands::{CONFIG, EXEC, SHELL, Services};
use crate::node::{Fragment, Node};
use crate::session::{Request, Signal};

const SECS_PER_MIN: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MIN;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;

/// Register the system command fragments.
pub fn register(builder: &mut CliBuilder, services: &Services) -> Result<()> {
    builder.link(Fragment::new(EXEC, [Node::keyword("quit", "Quit GVD")
        .then([Node::end(|_: &mut Request| Ok(Signal::Exit))])]))?;

    builder.link(Fragment::new(EXEC, [Node::keyword(
        "configure",
        "Enter configuration mode",
    )
    .then([Node::keyword("terminal", "Configure from the terminal")
        .then([Node::end(|_: &mut Request| Ok(Signal::Continue)).submode(CONFIG)])])]))?;

    let system = Arc::clone(&services.system);
    builder.link(Fragment::new(EXEC, [Node::keyword(
        "show",
        "Show running system information",
    )
    .then([Node::keyword("version", "System hardware and software status")
        .then([Node::end(move |req: &mut Request| show_version(system.as_ref(), req))])])]))?;

    let time = Arc::clone(&services.time);
    builder.link(Fragment::new(EXEC, [Node::keyword(
        "show",
        "Show running system information",
    )
    .then([Node::keyword("time", "System time")
        .then([Node::end(move |req: &mut Request| show_time(time.as_ref(), req))])])]))?;

    builder.link(Fragment::new(EXEC, [Node::keyword("shell", "Run linux shell commands")
        .then([Node::end(|_: &mut Request| Ok(Signal::Continue)).submode(SHELL)])]))?;

    let shell = Arc::clone(&services.shell);
    builder.link(Fragment::new(SHELL, [Node::keyword(
        "exec",
        "Execute a linux shell command",
    )
    .then([Node::text(
        "command",
        "Linux shell command, embraced with quotes if contain space",
    )
    .then([Node::end(move |req: &mut Request| shell_exec(shell.as_ref(), req))])])]))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// show version
// ---------------------------------------------------------------------------

fn show_version(system: &dyn SystemService, req: &mut Request) -> Result<Signal> {
    let info = system.system_info()?;
    write_version(&info, req)?;
    Ok(Signal::Continue)
}

fn write_version(info: &SystemInfo, out: &mut impl Write) -> std::fmt::Result {
    let (built, owner, location) = match &info.exe {
        Some(exe) => (
            exe.modified.format("%a %d-%b-%y %H:%M").to_string(),
            exe.owner.as_str(),
            exe.path.display().to_string(),
        ),
        None => (String::new(), "", String::new()),
    };
    writeln!(out, "GenericCallHome Vritual Device(GVD)")?;
    writeln!(out, "Compiled {built} by {owner}")?;
    writeln!(out)?;
    writeln!(out, "{} uptime is {}", info.hostname, format_uptime(info.uptime_secs))?;
    writeln!(out, "System version: {}", info.version)?;
    writeln!(out)?;
    writeln!(out, "{} release version: {}", info.os_type, info.release)?;
    writeln!(
        out,
        "Platform {}, total memory {} KB, total process {}",
        info.machine, info.total_mem_kb, info.process_count
    )?;
    writeln!(out, "GVD run as {location}\n")
}

/// Render an uptime as weeks, days, hours and minutes, omitting leading
/// zero units.
pub(crate) fn format_uptime(secs: u64) -> String {
    let weeks = secs / SECS_PER_WEEK;
    let days = secs % SECS_PER_WEEK / SECS_PER_DAY;
    let hours = secs % SECS_PER_DAY / SECS_PER_HOUR;
    let minutes = secs % SECS_PER_HOUR / SECS_PER_MIN;

    let units = [(weeks, "week"), (days, "day"), (hours, "hour"), (minutes, "minute")];
    let lead = units[..3].iter().position(|&(n, _)| n != 0).unwrap_or(3);
    units[lead..]
        .iter()
        .map(|&(n, unit)| {
            if n <= 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// show time
// ---------------------------------------------------------------------------

fn show_time(time: &dyn TimeService, req: &mut Request) -> Result<Signal> {
    let now = time.now()?;
    writeln!(req, "{}", now.format("%a %b %d %T %Z %Y"))?;
    Ok(Signal::Continue)
}

// ---------------------------------------------------------------------------
// shell exec
// ---------------------------------------------------------------------------

fn shell_exec(shell: &dyn ShellService, req: &mut Request) -> Result<Signal> {
    let command = req.str("command").unwrap_or_default().to_string();
    let output = shell.run(&command)?;
    write!(req, "{output}\n\n")?;
    Ok(Signal::Continue)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{Local, TimeZone};
    use gvd_platform::ExeInfo;

    use super::*;

    #[test]
    fn uptime_minutes_only() {
        assert_eq!(format_uptime(0), "0 minute");
        assert_eq!(format_uptime(61), "1 minute");
        assert_eq!(format_uptime(59 * 60), "59 minutes");
    }

    #[test]
    fn uptime_keeps_inner_zero_units() {
        assert_eq!(format_uptime(SECS_PER_HOUR), "1 hour, 0 minute");
        assert_eq!(
            format_uptime(SECS_PER_DAY + 5 * SECS_PER_MIN),
            "1 day, 0 hour, 5 minutes"
        );
        assert_eq!(
            format_uptime(3 * SECS_PER_WEEK + 2 * SECS_PER_HOUR),
            "3 weeks, 0 day, 2 hours, 0 minute"
        );
    }

    #[test]
    fn uptime_from_proc_sample() {
        // 1 day, 2 hours, 3 minutes, 4 seconds
        assert_eq!(format_uptime(93784), "1 day, 2 hours, 3 minutes");
    }

    #[test]
    fn version_report_layout() {
        let modified = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let info = SystemInfo {
            hostname: "router1".into(),
            os_type: "Linux".into(),
            release: "6.1.0".into(),
            version: "#1 SMP".into(),
            machine: "x86_64".into(),
            uptime_secs: 120,
            total_mem_kb: 2048,
            process_count: 17,
            exe: Some(ExeInfo {
                path: PathBuf::from("/usr/bin/gvd"),
                modified,
                owner: "build".into(),
            }),
        };
        let mut out = String::new();
        write_version(&info, &mut out).unwrap();
        assert_eq!(
            out,
            "GenericCallHome Vritual Device(GVD)\n\
             Compiled Tue 05-Mar-24 14:07 by build\n\
             \n\
             router1 uptime is 2 minutes\n\
             System version: #1 SMP\n\
             \n\
             Linux release version: 6.1.0\n\
             Platform x86_64, total memory 2048 KB, total process 17\n\
             GVD run as /usr/bin/gvd\n\n"
        );
    }

    #[test]
    fn version_report_without_exe_info() {
        let info = SystemInfo {
            hostname: "h".into(),
            os_type: "Linux".into(),
            release: "r".into(),
            version: "v".into(),
            machine: "m".into(),
            uptime_secs: 0,
            total_mem_kb: 0,
            process_count: 0,
            exe: None,
        };
        let mut out = String::new();
        write_version(&info, &mut out).unwrap();
        assert!(out.contains("Compiled  by \n"));
        assert!(out.ends_with("GVD run as \n\n"));
    }
}
