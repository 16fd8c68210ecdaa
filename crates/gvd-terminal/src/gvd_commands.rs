//! GVD demo commands spread across the exec and configuration modes.

use std::fmt::Write;

use gvd_types::error::Result;

use crate::cli::CliBuilder;
use crate::commands::{CONFIG, CONFIG_GVD, EXEC};
use crate::node::{Fragment, Node};
use crate::parser::WEEK_DAYS;
use crate::session::{Request, Signal};

pub fn register(builder: &mut CliBuilder) -> Result<()> {
    builder.link(Fragment::new(EXEC, [Node::keyword("gvd", "GVD exec command").then([
        Node::keyword("show", "show GVD stuff").then([Node::end(|req: &mut Request| {
            writeln!(req, "Dummy cmd, gvd show")?;
            Ok(Signal::Continue)
        })]),
    ])]))?;

    builder.link(Fragment::new(CONFIG, [
        Node::keyword("gvd-global", "GVD global config").then([Node::end(
            |req: &mut Request| {
                let prefix = prefix(req);
                writeln!(req, "Dummy cmd, {prefix}gvd globally config")?;
                Ok(Signal::Continue)
            },
        )]),
        Node::keyword("gvd-config", "GVD config mode")
            .then([Node::end(|_: &mut Request| Ok(Signal::Continue)).submode(CONFIG_GVD)]),
    ]))?;

    builder.link(Fragment::new(CONFIG_GVD, [
        Node::keyword("gvd-local", "GVD local config").then([Node::end(|req: &mut Request| {
            let prefix = prefix(req);
            writeln!(req, "Dummy cmd, {prefix}gvd locally config")?;
            Ok(Signal::Continue)
        })]),
        retry(),
        schedule(),
        level(),
    ]))?;
    Ok(())
}

/// `no ` or `default ` when the line carried that prefix.
fn prefix(req: &Request) -> &'static str {
    if req.negated() {
        "no "
    } else if req.defaulted() {
        "default "
    } else {
        ""
    }
}

// ---------------------------------------------------------------------------
// gvd-retry
// ---------------------------------------------------------------------------

/// `gvd-retry <1-10>`; the negated form takes no count.
fn retry() -> Node {
    Node::keyword("gvd-retry", "GVD retry count").then([
        Node::if_else(|req: &Request| req.negated()).then([Node::end(run_retry)]),
        Node::number("count", 1, 10, "Number of retries").then([Node::end(run_retry)]),
    ])
}

fn run_retry(req: &mut Request) -> Result<Signal> {
    let prefix = prefix(req);
    match req.int("count") {
        Some(n) => writeln!(req, "Dummy cmd, {prefix}gvd retry {n}")?,
        None => writeln!(req, "Dummy cmd, {prefix}gvd retry")?,
    }
    Ok(Signal::Continue)
}

// ---------------------------------------------------------------------------
// gvd-schedule
// ---------------------------------------------------------------------------

fn schedule() -> Node {
    Node::keyword("gvd-schedule", "GVD weekly schedule").then([Node::help(
        "Days of the week:",
        |req: &mut Request| writeln!(req, "  {}", WEEK_DAYS.join(" ")),
    )
    .then([Node::week_day("day", "Day of the schedule").then([
        Node::time("at", "Time of day").then([Node::end(|req: &mut Request| {
            let day = req.int("day").unwrap_or_default();
            let (hour, minute) = req.time("at").unwrap_or_default();
            let name = usize::try_from(day - 1)
                .ok()
                .and_then(|i| WEEK_DAYS.get(i))
                .copied()
                .unwrap_or("?");
            let prefix = prefix(req);
            writeln!(
                req,
                "Dummy cmd, {prefix}gvd schedule {name} {hour:02}:{minute:02}"
            )?;
            Ok(Signal::Continue)
        })]),
    ])])])
}

// ---------------------------------------------------------------------------
// gvd-level
// ---------------------------------------------------------------------------

fn level() -> Node {
    let run = |req: &mut Request| -> Result<Signal> {
        let level = req.int("level").unwrap_or_default();
        let prefix = prefix(req);
        writeln!(req, "Dummy cmd, {prefix}gvd level {level}")?;
        Ok(Signal::Continue)
    };
    Node::keyword("gvd-level", "GVD verbosity level").then([
        Node::keyword_id("high", "level", 2, "Verbose output").then([Node::end(run)]),
        Node::keyword_id("low", "level", 1, "Quiet output").then([Node::end(run)]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ModeId;

    #[test]
    fn prefix_prefers_no_over_default() {
        let mut req = Request::new(ModeId::new("m"));
        assert_eq!(prefix(&req), "");
        req.set_defaulted();
        assert_eq!(prefix(&req), "default ");
        req.set_negated();
        assert_eq!(prefix(&req), "no ");
    }
}
