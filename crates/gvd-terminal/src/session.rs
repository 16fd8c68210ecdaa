//! Per-terminal session state and the per-call request context.

use std::collections::HashMap;
use std::fmt;

use crate::mode::{ModeId, Transition};

/// State of one terminal attached to the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) mode: ModeId,
}

impl Session {
    pub(crate) fn new(mode: ModeId) -> Self {
        Self { mode }
    }

    /// Mode the session is currently in.
    pub fn mode(&self) -> ModeId {
        self.mode
    }
}

/// A captured parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    Time { hour: u8, minute: u8 },
}

/// What a command asks the terminal to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    /// Close the session.
    Exit,
}

/// Result of executing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub signal: Signal,
    pub output: String,
}

/// Context handed to command handlers, predicates, and help suppliers.
///
/// Created fresh for every call and dropped when the call returns, so
/// captured values never leak between requests. Output is written through
/// [`fmt::Write`].
#[derive(Debug)]
pub struct Request {
    mode: ModeId,
    params: HashMap<String, Value>,
    negated: bool,
    defaulted: bool,
    flag: i64,
    out: String,
    transition: Option<Transition>,
}

impl Request {
    pub(crate) fn new(mode: ModeId) -> Self {
        Self {
            mode,
            params: HashMap::new(),
            negated: false,
            defaulted: false,
            flag: 0,
            out: String::new(),
            transition: None,
        }
    }

    /// Mode of the session issuing the request.
    pub fn mode(&self) -> ModeId {
        self.mode
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.params.get(name) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.params.get(name) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Captured `hh:mm` value as `(hour, minute)`.
    pub fn time(&self, name: &str) -> Option<(u8, u8)> {
        match self.params.get(name) {
            Some(Value::Time { hour, minute }) => Some((*hour, *minute)),
            _ => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// The line was prefixed with "no".
    pub fn negated(&self) -> bool {
        self.negated
    }

    /// The line was prefixed with "default".
    pub fn defaulted(&self) -> bool {
        self.defaulted
    }

    /// Flag value carried by the terminal node that matched.
    pub fn flag(&self) -> i64 {
        self.flag
    }

    /// Leave the current mode for its parent once the handler returns.
    pub fn exit_mode(&mut self) {
        self.transition = Some(Transition::Parent);
    }

    /// Return to the apex mode once the handler returns.
    pub fn end_mode(&mut self) {
        self.transition = Some(Transition::Apex);
    }

    pub(crate) fn capture(&mut self, name: &str, value: Value) {
        self.params.insert(name.to_string(), value);
    }

    pub(crate) fn set_negated(&mut self) {
        self.negated = true;
    }

    pub(crate) fn set_defaulted(&mut self) {
        self.defaulted = true;
    }

    pub(crate) fn set_flag(&mut self, flag: i64) {
        self.flag = flag;
    }

    pub(crate) fn transition(&self) -> Option<Transition> {
        self.transition
    }

    pub(crate) fn take_output(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}

impl fmt::Write for Request {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.push_str(s);
        Ok(())
    }
}
