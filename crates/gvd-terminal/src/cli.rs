//! The assembled CLI and its builder.

use std::borrow::Cow;
use std::collections::HashMap;

use gvd_types::config::CliConfig;
use gvd_types::error::{GvdError, Result};

use crate::complete::{self, Completion};
use crate::help::{self, Layout};
use crate::mode::{ModeDef, ModeId, ModeTable, Transition};
use crate::node::{Fragment, Node, NodeKind};
use crate::parser::{self, ParseError};
use crate::session::{Reply, Request, Session, Signal};
use crate::tokenizer::{Token, tokenize};
use crate::tree::{self, CommandTree};

const DEFAULT_HOSTNAME: &str = "gvd";

/// Collects fragments per mode and produces a [`Cli`].
pub struct CliBuilder {
    modes: ModeTable,
    config: CliConfig,
    hostname: String,
    grammar: HashMap<ModeId, Vec<Node>>,
}

impl CliBuilder {
    pub fn new(modes: ModeTable, config: CliConfig) -> Self {
        Self {
            modes,
            config,
            hostname: DEFAULT_HOSTNAME.to_string(),
            grammar: HashMap::new(),
        }
    }

    /// Host name for the prompt when the configuration does not set one.
    pub fn hostname(mut self, name: impl Into<String>) -> Self {
        self.hostname = name.into();
        self
    }

    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    /// Validate `fragment` and merge it into its mode's grammar.
    pub fn link(&mut self, fragment: Fragment) -> Result<()> {
        if !self.modes.contains(fragment.mode) {
            return Err(GvdError::Mode(format!(
                "fragment targets unknown mode {}",
                fragment.mode
            )));
        }
        tree::validate(&fragment.roots, &self.modes)?;
        log::debug!(
            "linking {} root(s) into mode {}",
            fragment.roots.len(),
            fragment.mode
        );
        let base = self.grammar.remove(&fragment.mode).unwrap_or_default();
        self.grammar
            .insert(fragment.mode, tree::merge(base, fragment.roots));
        Ok(())
    }

    /// Freeze every mode's grammar.
    pub fn build(mut self) -> Cli {
        let trees = self
            .modes
            .iter()
            .map(|def| {
                let roots = self.grammar.remove(&def.id).unwrap_or_default();
                (def.id, CommandTree::freeze(roots, def))
            })
            .collect();
        let hostname = self.config.hostname.clone().unwrap_or(self.hostname);
        Cli {
            modes: self.modes,
            trees,
            config: self.config,
            hostname,
        }
    }
}

/// The immutable command-line engine.
///
/// Shared between sessions; every call works on a fresh request and never
/// mutates the trees.
pub struct Cli {
    modes: ModeTable,
    trees: HashMap<ModeId, CommandTree>,
    config: CliConfig,
    hostname: String,
}

impl Cli {
    /// A new session positioned at the apex mode.
    pub fn session(&self) -> Session {
        Session::new(self.modes.apex())
    }

    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn tree(&self, mode: ModeId) -> Option<&CommandTree> {
        self.trees.get(&mode)
    }

    /// `host#` at the apex, `host(fragment)#` elsewhere.
    pub fn prompt(&self, session: &Session) -> String {
        match self.def(session.mode) {
            Some(def) if def.parent.is_some() => format!("{}({})#", self.hostname, def.prompt),
            _ => format!("{}#", self.hostname),
        }
    }

    /// Parse and run one line.
    pub fn execute(&self, session: &mut Session, line: &str) -> Reply {
        let Some((tree, working)) = self.target(session, line) else {
            return Reply {
                signal: Signal::Continue,
                output: String::new(),
            };
        };
        let tokens = match tokenize(&working, self.config.max_tokens) {
            Ok(tokens) if tokens.is_empty() => {
                return Reply {
                    signal: Signal::Continue,
                    output: String::new(),
                };
            },
            Ok(tokens) => tokens,
            Err(e) => {
                return self.reject(session, line, ParseError::Syntax {
                    position: e.position,
                });
            },
        };

        let mut req = Request::new(session.mode);
        let end = match parser::parse(tree, &mut req, &tokens)
            .and_then(|head| parser::resolve_end(tree, &req, head))
        {
            Ok(end) => end,
            Err(e) => return self.reject(session, line, e),
        };
        let NodeKind::End {
            handler,
            submode,
            flag,
        } = &tree.node(end).kind
        else {
            return self.reject(session, line, ParseError::Incomplete);
        };

        req.set_flag(*flag);
        let result = handler(&mut req);
        let mut output = req.take_output();
        let signal = match result {
            Ok(signal) => signal,
            Err(e) => {
                // A failed command leaves the session where it was.
                log::warn!("command '{}' failed: {e}", line.trim());
                output.push_str(&format!("% {e}\n\n"));
                return Reply {
                    signal: Signal::Continue,
                    output,
                };
            },
        };
        if signal == Signal::Exit {
            return Reply { signal, output };
        }

        let before = session.mode;
        if let Some(transition) = req.transition() {
            session.mode = self.modes.resolve(session.mode, transition);
        }
        if let Some(mode) = submode
            && !req.negated()
            && !req.defaulted()
        {
            session.mode = self.modes.resolve(session.mode, Transition::Enter(*mode));
        }
        if session.mode != before {
            log::info!("mode {before} -> {}", session.mode);
        }
        Reply { signal, output }
    }

    /// Help listing for what may follow `line`.
    ///
    /// Unless `line` ends in a space, its last token filters the keywords
    /// listed. Lines that do not parse produce no listing.
    pub fn help(&self, session: &Session, line: &str) -> String {
        let Some((tree, working)) = self.target(session, line) else {
            return String::new();
        };
        let tokens = match tokenize(&working, self.config.max_tokens) {
            Ok(tokens) => tokens,
            Err(e) => {
                return ParseError::Syntax {
                    position: e.position,
                }
                .render(line, self.prompt_width(session));
            },
        };
        let (confirmed, filter) = split_filter(&working, &tokens);
        if filter.starts_with('"') {
            return String::new();
        }

        let mut req = Request::new(session.mode);
        let head = match parser::parse(tree, &mut req, confirmed) {
            Ok(head) => head,
            Err(e) => {
                log::debug!("no help for '{line}': {e}");
                return String::new();
            },
        };
        let picked = help::collect(tree, &req, head, filter);
        if picked.is_empty() {
            return String::new();
        }
        let name = self.def(session.mode).map_or("", |d| d.name.as_str());
        let layout = Layout {
            width: self.config.line_width,
            indent: self.config.help_indent,
        };
        help::render(tree, &mut req, &picked, name, layout).unwrap_or_else(|e| {
            log::warn!("help supplier failed for '{line}': {e}");
            String::new()
        })
    }

    /// Complete the last token of `line`.
    pub fn complete(&self, session: &Session, line: &str) -> Completion {
        let Some((tree, working)) = self.target(session, line) else {
            return Completion::unchanged(line);
        };
        if working.ends_with(' ') {
            return Completion::unchanged(line);
        }
        let Ok(tokens) = tokenize(&working, self.config.max_tokens) else {
            return Completion::unchanged(line);
        };
        let Some((last, confirmed)) = tokens.split_last() else {
            return Completion::unchanged(line);
        };
        if last.is_quoted() {
            return Completion::unchanged(line);
        }

        let mut req = Request::new(session.mode);
        let Ok(head) = parser::parse(tree, &mut req, confirmed) else {
            return Completion::unchanged(line);
        };
        let labels: Vec<&str> = help::collect(tree, &req, head, last.text)
            .into_iter()
            .map(|id| tree.node(id).label())
            .collect();
        complete::fill(line, last.start, &labels)
    }

    fn def(&self, mode: ModeId) -> Option<&ModeDef> {
        self.modes.get(mode)
    }

    fn prompt_width(&self, session: &Session) -> usize {
        self.prompt(session).chars().count()
    }

    fn reject(&self, session: &Session, line: &str, err: ParseError) -> Reply {
        log::debug!("rejected '{line}': {err:?}");
        Reply {
            signal: Signal::Continue,
            output: err.render(line, self.prompt_width(session)),
        }
    }

    /// Tree to walk for `line`, and the line as the walker should see it.
    ///
    /// Outside the apex a leading "do" word runs the rest of the line
    /// against the apex tree. The word is blanked rather than removed so
    /// byte offsets still point into the typed line.
    fn target<'l>(&self, session: &Session, line: &'l str) -> Option<(&CommandTree, Cow<'l, str>)> {
        let apex = self.modes.apex();
        if session.mode != apex {
            let lead = line.len() - line.trim_start_matches(' ').len();
            let rest = &line[lead..];
            if rest == "do" || rest.starts_with("do ") {
                let mut working = line.to_string();
                working.replace_range(lead..lead + 2, "  ");
                return self.trees.get(&apex).map(|t| (t, Cow::Owned(working)));
            }
        }
        self.trees
            .get(&session.mode)
            .map(|t| (t, Cow::Borrowed(line)))
    }
}

/// Split tokens into those already confirmed and the partial last word.
fn split_filter<'a, 't>(working: &str, tokens: &'a [Token<'t>]) -> (&'a [Token<'t>], &'t str) {
    match tokens.split_last() {
        Some((last, confirmed)) if !working.ends_with(' ') => (confirmed, last.text),
        _ => (tokens, ""),
    }
}
