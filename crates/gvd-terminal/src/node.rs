//! Grammar nodes and the fragment declarations built from them.
//!
//! A grammar is declared as owned trees of [`Node`]. Each node's `accept`
//! list is the alternate chain tried for the next token once this node
//! matched; siblings in a list are alternates of one another. Fragments
//! targeting the same mode are merged and then frozen into a
//! [`CommandTree`](crate::tree::CommandTree).

use std::fmt;
use std::sync::Arc;

use gvd_types::error::Result;

use crate::mode::ModeId;
use crate::session::{Request, Signal};

/// Command handler run when a line reaches its terminal node.
pub type CommandFn = Arc<dyn Fn(&mut Request) -> Result<Signal> + Send + Sync>;

/// Predicate choosing the branch of an if-else node.
pub type PredicateFn = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Supplier writing dynamic text at the top of a help listing.
pub type HelpFn = Arc<dyn Fn(&mut Request) -> fmt::Result + Send + Sync>;

/// The closed set of node kinds.
#[derive(Clone)]
pub enum NodeKind {
    /// Matches nothing; terminates chains.
    Dead,
    Keyword {
        word: String,
    },
    /// A keyword whose match stores `value` under `param`.
    KeywordId {
        word: String,
        param: String,
        value: i64,
    },
    /// The "no" prefix.
    No,
    /// The "default" prefix.
    Default,
    Number {
        param: String,
        min: i64,
        max: i64,
    },
    /// Bare or quoted text; `max_len` of 0 means unlimited.
    Text {
        param: String,
        max_len: usize,
    },
    WeekDay {
        param: String,
    },
    Time {
        param: String,
    },
    /// Zero-width branch: accept when the predicate holds, alternate otherwise.
    IfElse {
        predicate: PredicateFn,
    },
    /// Zero-width help supplier; always continues into accept.
    Help {
        supplier: HelpFn,
    },
    /// Terminal node.
    End {
        handler: CommandFn,
        submode: Option<ModeId>,
        flag: i64,
    },
}

impl NodeKind {
    /// Keyword-bearing kinds match tokens by case-insensitive prefix.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Keyword { .. } | Self::KeywordId { .. } | Self::No | Self::Default
        )
    }

    /// Parameter-bearing kinds are the fallback when no keyword matches.
    pub fn is_param(&self) -> bool {
        matches!(
            self,
            Self::Number { .. } | Self::Text { .. } | Self::WeekDay { .. } | Self::Time { .. }
        )
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End { .. })
    }

    /// Same kind and, for keywords, the same literal (case-sensitive).
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Keyword { word: a }, Self::Keyword { word: b }) => a == b,
            (Self::KeywordId { word: a, .. }, Self::KeywordId { word: b, .. }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Dead => "dead",
            Self::Keyword { .. } => "keyword",
            Self::KeywordId { .. } => "keyword-id",
            Self::No => "no",
            Self::Default => "default",
            Self::Number { .. } => "number",
            Self::Text { .. } => "string",
            Self::WeekDay { .. } => "week-day",
            Self::Time { .. } => "time",
            Self::IfElse { .. } => "if-else",
            Self::Help { .. } => "help",
            Self::End { .. } => "end",
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword { word } => write!(f, "Keyword({word})"),
            Self::KeywordId { word, param, value } => {
                write!(f, "KeywordId({word}, {param}={value})")
            },
            Self::Number { param, min, max } => write!(f, "Number({param}, {min}..={max})"),
            Self::Text { param, max_len } => write!(f, "Text({param}, max {max_len})"),
            Self::WeekDay { param } => write!(f, "WeekDay({param})"),
            Self::Time { param } => write!(f, "Time({param})"),
            Self::End { submode, flag, .. } => write!(f, "End({submode:?}, flag {flag})"),
            other => f.write_str(other.name()),
        }
    }
}

/// A declared grammar node with its accept subtree.
#[derive(Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) label: String,
    pub(crate) help: String,
    pub(crate) accept: Vec<Node>,
}

impl Node {
    fn with(kind: NodeKind, label: &str, help: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
            help: help.to_string(),
            accept: Vec::new(),
        }
    }

    pub fn keyword(word: &str, help: &str) -> Self {
        Self::with(
            NodeKind::Keyword {
                word: word.to_string(),
            },
            word,
            help,
        )
    }

    /// Keyword that stores `value` under `param` when matched.
    pub fn keyword_id(word: &str, param: &str, value: i64, help: &str) -> Self {
        Self::with(
            NodeKind::KeywordId {
                word: word.to_string(),
                param: param.to_string(),
                value,
            },
            word,
            help,
        )
    }

    /// Integer in `min..=max`. Displayed as `<min-max>` once frozen.
    pub fn number(param: &str, min: i64, max: i64, help: &str) -> Self {
        Self::with(
            NodeKind::Number {
                param: param.to_string(),
                min,
                max,
            },
            "NUMBER",
            help,
        )
    }

    /// Bare word or quoted string of any length.
    pub fn text(param: &str, help: &str) -> Self {
        Self::with(
            NodeKind::Text {
                param: param.to_string(),
                max_len: 0,
            },
            "WORD",
            help,
        )
    }

    /// Limit a text node to `max` characters after unquoting.
    pub fn max_len(mut self, max: usize) -> Self {
        if let NodeKind::Text { max_len, .. } = &mut self.kind {
            *max_len = max;
        }
        self
    }

    /// Day of the week, captured as 1 (Monday) through 7 (Sunday).
    pub fn week_day(param: &str, help: &str) -> Self {
        Self::with(
            NodeKind::WeekDay {
                param: param.to_string(),
            },
            "DAY",
            help,
        )
    }

    pub fn time(param: &str, help: &str) -> Self {
        Self::with(
            NodeKind::Time {
                param: param.to_string(),
            },
            "hh:mm",
            help,
        )
    }

    /// Branch on `predicate`.
    ///
    /// The accept list given with [`then`](Self::then) is used when the
    /// predicate holds; the siblings after this node are used otherwise.
    pub fn if_else<P>(predicate: P) -> Self
    where
        P: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self::with(
            NodeKind::IfElse {
                predicate: Arc::new(predicate),
            },
            "",
            "",
        )
    }

    /// Print `text` and then `supplier`'s output ahead of the listing for
    /// this position. Parsing continues into the accept list.
    pub fn help<H>(text: &str, supplier: H) -> Self
    where
        H: Fn(&mut Request) -> fmt::Result + Send + Sync + 'static,
    {
        Self::with(
            NodeKind::Help {
                supplier: Arc::new(supplier),
            },
            "",
            text,
        )
    }

    /// Terminal node running `handler`.
    pub fn end<F>(handler: F) -> Self
    where
        F: Fn(&mut Request) -> Result<Signal> + Send + Sync + 'static,
    {
        Self::with(
            NodeKind::End {
                handler: Arc::new(handler),
                submode: None,
                flag: 0,
            },
            "<cr>",
            "",
        )
    }

    /// Enter `mode` after the handler succeeds (unless "no"/"default" was used).
    pub fn submode(mut self, mode: ModeId) -> Self {
        if let NodeKind::End { submode, .. } = &mut self.kind {
            *submode = Some(mode);
        }
        self
    }

    /// Opaque value delivered to the handler through [`Request::flag`].
    pub fn flag(mut self, value: i64) -> Self {
        if let NodeKind::End { flag, .. } = &mut self.kind {
            *flag = value;
        }
        self
    }

    /// Set the chain tried after this node matches.
    pub fn then(mut self, accept: impl IntoIterator<Item = Node>) -> Self {
        self.accept = accept.into_iter().collect();
        self
    }

    pub(crate) fn prefix_no() -> Self {
        Self::with(NodeKind::No, "no", "Negate a command or set its defaults")
    }

    pub(crate) fn prefix_default() -> Self {
        Self::with(NodeKind::Default, "default", "Set a command to its defaults")
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn accept(&self) -> &[Node] {
        &self.accept
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("help", &self.help)
            .field("accept", &self.accept)
            .finish()
    }
}

/// A chain of root nodes contributed to one mode.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub mode: ModeId,
    pub roots: Vec<Node>,
}

impl Fragment {
    pub fn new(mode: ModeId, roots: impl IntoIterator<Item = Node>) -> Self {
        Self {
            mode,
            roots: roots.into_iter().collect(),
        }
    }
}
