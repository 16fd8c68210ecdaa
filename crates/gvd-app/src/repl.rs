//! Line-oriented console loop.
//!
//! Each input line is one request. A trailing `?` asks for help on the
//! text before it and a trailing tab asks for completion; in both cases the
//! prompt is reprinted with the pending text so it can be retyped.

use std::io::{self, BufRead, Write};

use gvd_terminal::{Cli, Session, Signal};

use crate::console::ConsoleTranscript;

pub const BANNER: &str = "\
=======================================
| GenericCallHome Virtual Device(GVD) |
=======================================
";

/// What a typed line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Help(&'a str),
    Complete(&'a str),
    Execute(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(text) = line.strip_suffix('?') {
            Self::Help(text)
        } else if let Some(text) = line.strip_suffix('\t') {
            Self::Complete(text)
        } else {
            Self::Execute(line)
        }
    }
}

/// Drive `cli` from `input` until "quit" or end of input.
pub fn run<R: BufRead, W: Write>(
    cli: &Cli,
    transcript: &ConsoleTranscript,
    banner: bool,
    mut input: R,
    mut out: W,
) -> io::Result<()> {
    let mut session = cli.session();
    if banner {
        emit(&mut out, transcript, BANNER)?;
    }

    let mut line = String::new();
    loop {
        let prompt = cli.prompt(&session);
        out.write_all(prompt.as_bytes())?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            out.write_all(b"\n")?;
            log::debug!("end of input");
            return Ok(());
        }
        transcript.record(&format!("{prompt}{}\n", line.trim_end_matches(['\n', '\r'])));

        match Input::classify(&line) {
            Input::Help(text) => {
                let listing = cli.help(&session, text);
                emit(&mut out, transcript, &listing)?;
                echo_pending(&mut out, cli, &session, text)?;
            },
            Input::Complete(text) => {
                let completion = cli.complete(&session, text);
                if let Some(listing) = &completion.listing {
                    emit(&mut out, transcript, &format!("{listing}\n"))?;
                }
                echo_pending(&mut out, cli, &session, &completion.line)?;
            },
            Input::Execute(text) => {
                let reply = cli.execute(&mut session, text);
                emit(&mut out, transcript, &reply.output)?;
                if reply.signal == Signal::Exit {
                    log::info!("session closed");
                    return Ok(());
                }
            },
        }
    }
}

fn emit<W: Write>(out: &mut W, transcript: &ConsoleTranscript, text: &str) -> io::Result<()> {
    transcript.record(text);
    out.write_all(text.as_bytes())
}

/// Show the text still waiting to be completed.
fn echo_pending<W: Write>(out: &mut W, cli: &Cli, session: &Session, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}{text}", cli.prompt(session))
}
