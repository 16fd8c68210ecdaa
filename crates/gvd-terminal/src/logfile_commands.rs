//! `logfile flush` and `logfile clear`.
//!
//! Declared as two fragments sharing the `logfile` keyword so the merge
//! joins them under one node.

use std::fmt::Write;
use std::sync::Arc;

use gvd_types::error::Result;

use crate::cli::CliBuilder;
use crate::commands::{EXEC, Services};
use crate::node::{Fragment, Node};
use crate::session::{Request, Signal};

const LOGFILE_HELP: &str = "Do action on console log file";

pub fn register(builder: &mut CliBuilder, services: &Services) -> Result<()> {
    let console = Arc::clone(&services.console);
    builder.link(Fragment::new(EXEC, [Node::keyword("logfile", LOGFILE_HELP).then([
        Node::keyword("flush", "Flush all console content to log file").then([Node::end(
            move |req: &mut Request| {
                writeln!(req, "All console content dumped.")?;
                console.flush()?;
                Ok(Signal::Continue)
            },
        )]),
    ])]))?;

    let console = Arc::clone(&services.console);
    builder.link(Fragment::new(EXEC, [Node::keyword("logfile", LOGFILE_HELP).then([
        Node::keyword("clear", "Clear console log file").then([Node::end(
            move |_: &mut Request| {
                console.clear()?;
                Ok(Signal::Continue)
            },
        )]),
    ])]))?;
    Ok(())
}
