//! Token-by-token matching against a [`CommandTree`].

use crate::node::NodeKind;
use crate::session::{Request, Value};
use crate::tokenizer::Token;
use crate::tree::{CommandTree, NodeId};

pub(crate) const WEEK_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Why a line could not be matched. Positions are byte offsets into the
/// line as typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid command.")]
    Syntax { position: usize },
    #[error("Unrecognized command.")]
    NotFound { position: usize },
    #[error("Ambiguous command.")]
    Ambiguous { position: usize },
    #[error("Invalid parameter.")]
    ParamFail { position: usize },
    #[error("Incomplete command.")]
    Incomplete,
}

impl ParseError {
    /// Byte offset the caret should point at, if any.
    pub fn position(&self) -> Option<usize> {
        match *self {
            Self::Syntax { position }
            | Self::NotFound { position }
            | Self::Ambiguous { position }
            | Self::ParamFail { position } => Some(position),
            Self::Incomplete => None,
        }
    }

    /// Render as a caret line (when positioned) plus the message and a
    /// blank line. `offset` is the prompt width.
    pub fn render(&self, line: &str, offset: usize) -> String {
        let mut out = String::new();
        if let Some(pos) = self.position() {
            let column = line.get(..pos).map_or(pos, |s| s.chars().count());
            out.push_str(&" ".repeat(offset + column));
            out.push_str("^\n");
        }
        out.push_str(&self.to_string());
        out.push_str("\n\n");
        out
    }
}

// ---------------------------------------------------------------------------
// Chain walking
// ---------------------------------------------------------------------------

/// The node reached from `id` without consuming a token.
fn step(tree: &CommandTree, req: &Request, id: NodeId) -> NodeId {
    let node = tree.node(id);
    match &node.kind {
        NodeKind::End { .. } | NodeKind::Dead => NodeId::DEAD,
        NodeKind::IfElse { predicate } => {
            if predicate(req) {
                node.accept
            } else {
                node.alternate
            }
        },
        NodeKind::Help { .. } => node.accept,
        _ => node.alternate,
    }
}

/// Iterator over the candidates at one position, resolving zero-width
/// nodes against the request as it goes.
pub(crate) struct Chain<'t, 'r> {
    tree: &'t CommandTree,
    req: &'r Request,
    cur: NodeId,
}

impl<'t, 'r> Chain<'t, 'r> {
    pub(crate) fn new(tree: &'t CommandTree, req: &'r Request, head: NodeId) -> Self {
        Self {
            tree,
            req,
            cur: head,
        }
    }
}

impl Iterator for Chain<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.cur.is_dead() {
            return None;
        }
        let id = self.cur;
        self.cur = step(self.tree, self.req, id);
        Some(id)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Miss {
    NotFound,
    Ambiguous,
}

/// Pick the node `token` selects among the candidates starting at `head`.
fn match_token(tree: &CommandTree, req: &Request, head: NodeId, token: &str) -> Result<NodeId, Miss> {
    if token.starts_with('"') {
        return Chain::new(tree, req, head)
            .find(|&id| matches!(tree.node(id).kind, NodeKind::Text { .. }))
            .ok_or(Miss::NotFound);
    }

    let mut exact = None;
    let mut prefixed = Vec::new();
    let mut param = None;
    for id in Chain::new(tree, req, head) {
        let node = tree.node(id);
        if node.kind.is_keyword() {
            if keyword_prefix(&node.label, token) {
                prefixed.push(id);
                if exact.is_none() && node.label.eq_ignore_ascii_case(token) {
                    exact = Some(id);
                }
            }
        } else if node.kind.is_param() && param.is_none() {
            param = Some(id);
        }
    }

    if let Some(id) = exact {
        return Ok(id);
    }
    match prefixed.as_slice() {
        [only] => Ok(*only),
        [] => param.ok_or(Miss::NotFound),
        _ => Err(Miss::Ambiguous),
    }
}

/// `token` is a case-insensitive prefix of `keyword`.
pub(crate) fn keyword_prefix(keyword: &str, token: &str) -> bool {
    keyword
        .get(..token.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(token))
}

// ---------------------------------------------------------------------------
// Parameter extraction
// ---------------------------------------------------------------------------

/// Validate `token` against the matched node and record what it carries.
fn extract(kind: &NodeKind, token: &str, req: &mut Request) -> bool {
    match kind {
        NodeKind::No => req.set_negated(),
        NodeKind::Default => req.set_defaulted(),
        NodeKind::KeywordId { param, value, .. } => req.capture(param, Value::Int(*value)),
        NodeKind::Number { param, min, max } => match parse_number(token) {
            Some(n) if (*min..=*max).contains(&n) => req.capture(param, Value::Int(n)),
            _ => return false,
        },
        NodeKind::Text { param, max_len } => {
            let text = unquote(token);
            if *max_len > 0 && text.chars().count() > *max_len {
                return false;
            }
            req.capture(param, Value::Str(text));
        },
        NodeKind::WeekDay { param } => match week_day(token) {
            Some(day) => req.capture(param, Value::Int(day)),
            None => return false,
        },
        NodeKind::Time { param } => match parse_time(token) {
            Some((hour, minute)) => req.capture(param, Value::Time { hour, minute }),
            None => return false,
        },
        _ => {},
    }
    true
}

fn parse_number(token: &str) -> Option<i64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Strip surrounding quotes and resolve `\\` and `\"`. Other escapes keep
/// their backslash.
pub(crate) fn unquote(token: &str) -> String {
    let body = token.strip_prefix('"').unwrap_or(token);
    let body = body.strip_suffix('"').unwrap_or(body);
    let mut out = String::with_capacity(body.len());
    let mut escaped = false;
    for c in body.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        if escaped {
            escaped = false;
            if c != '\\' && c != '"' {
                out.push('\\');
            }
        }
        out.push(c);
    }
    out
}

/// Day number 1..=7 of the first weekday `token` abbreviates.
fn week_day(token: &str) -> Option<i64> {
    WEEK_DAYS
        .iter()
        .position(|day| keyword_prefix(day, token))
        .map(|i| i as i64 + 1)
}

fn parse_time(token: &str) -> Option<(u8, u8)> {
    let (h, m) = token.split_once(':')?;
    let hour: u8 = parse_number(h)?.try_into().ok()?;
    let minute: u8 = parse_number(m)?.try_into().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

// ---------------------------------------------------------------------------
// Whole-line parsing
// ---------------------------------------------------------------------------

/// Consume every token, returning the head of the chain that follows.
pub(crate) fn parse(
    tree: &CommandTree,
    req: &mut Request,
    tokens: &[Token<'_>],
) -> Result<NodeId, ParseError> {
    let mut head = tree.root();
    for token in tokens {
        let id = match match_token(tree, req, head, token.text) {
            Ok(id) => id,
            Err(Miss::NotFound) => {
                return Err(ParseError::NotFound {
                    position: token.start,
                });
            },
            Err(Miss::Ambiguous) => {
                return Err(ParseError::Ambiguous {
                    position: token.start,
                });
            },
        };
        let node = tree.node(id);
        if !extract(&node.kind, token.text, req) {
            return Err(ParseError::ParamFail {
                position: token.start,
            });
        }
        head = node.accept;
    }
    Ok(head)
}

/// With all tokens consumed, find the terminal node reachable from `head`.
///
/// The "no" and "default" prefixes are stepped into rather than over at
/// this stage.
pub(crate) fn resolve_end(tree: &CommandTree, req: &Request, head: NodeId) -> Result<NodeId, ParseError> {
    let mut id = head;
    while !id.is_dead() {
        let node = tree.node(id);
        id = match node.kind {
            NodeKind::End { .. } => return Ok(id),
            NodeKind::No | NodeKind::Default => node.accept,
            _ => step(tree, req, id),
        };
    }
    Err(ParseError::Incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{ModeDef, ModeId, ModeTable};
    use crate::node::Node;
    use crate::session::Signal;
    use crate::tokenizer::tokenize;

    const TOP: ModeId = ModeId::new("top");
    const CFG: ModeId = ModeId::new("cfg");

    fn ok(_: &mut Request) -> gvd_types::error::Result<Signal> {
        Ok(Signal::Continue)
    }

    fn tree_for(mode: ModeId, chain: Vec<Node>) -> CommandTree {
        let modes = ModeTable::new(vec![
            ModeDef::apex(TOP, "Exec"),
            ModeDef::child(CFG, TOP, "config", "Configure").configurable(),
        ])
        .unwrap();
        CommandTree::freeze(chain, modes.get(mode).unwrap())
    }

    fn sample() -> CommandTree {
        tree_for(
            TOP,
            vec![
                Node::keyword("show", "").then([
                    Node::keyword("version", "").then([Node::end(ok)]),
                    Node::keyword("time", "").then([Node::end(ok)]),
                ]),
                Node::keyword("shell", "").then([Node::end(ok)]),
                Node::keyword("exec", "").then([Node::text("cmd", "").then([Node::end(ok)])]),
                Node::keyword("retry", "")
                    .then([Node::number("count", 1, 10, "").then([Node::end(ok)])]),
                Node::keyword("at", "").then([Node::week_day("day", "")
                    .then([Node::time("when", "").then([Node::end(ok)])])]),
                Node::keyword("level", "").then([
                    Node::keyword_id("low", "lvl", 1, "").then([Node::end(ok)]),
                    Node::keyword_id("high", "lvl", 2, "").then([Node::end(ok)]),
                ]),
                Node::keyword("name", "")
                    .then([Node::text("name", "").max_len(4).then([Node::end(ok)])]),
            ],
        )
    }

    fn run(tree: &CommandTree, line: &str) -> Result<Request, ParseError> {
        let mut req = Request::new(TOP);
        let tokens = tokenize(line, 64).map_err(|e| ParseError::Syntax {
            position: e.position,
        })?;
        let head = parse(tree, &mut req, &tokens)?;
        resolve_end(tree, &req, head)?;
        Ok(req)
    }

    #[test]
    fn prefix_match_selects_unique_keyword() {
        let tree = sample();
        run(&tree, "show v").unwrap();
        run(&tree, "SHOW VERSION").unwrap();
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let tree = sample();
        assert_eq!(
            run(&tree, "sh").unwrap_err(),
            ParseError::Ambiguous { position: 0 }
        );
    }

    #[test]
    fn exact_keyword_beats_longer_prefix_match() {
        let tree = tree_for(
            TOP,
            vec![
                Node::keyword("show", "").then([Node::end(ok)]),
                Node::keyword("showall", "").then([Node::end(ok)]),
            ],
        );
        run(&tree, "show").unwrap();
        assert!(matches!(run(&tree, "sho"), Err(ParseError::Ambiguous { .. })));
    }

    #[test]
    fn unknown_token_position() {
        let tree = sample();
        assert_eq!(
            run(&tree, "show  bogus").unwrap_err(),
            ParseError::NotFound { position: 6 }
        );
    }

    #[test]
    fn missing_tail_is_incomplete() {
        let tree = sample();
        assert_eq!(run(&tree, "show").unwrap_err(), ParseError::Incomplete);
    }

    #[test]
    fn number_range_enforced() {
        let tree = sample();
        assert_eq!(run(&tree, "retry 10").unwrap().int("count"), Some(10));
        assert_eq!(
            run(&tree, "retry 11").unwrap_err(),
            ParseError::ParamFail { position: 6 }
        );
        assert!(matches!(run(&tree, "retry -1"), Err(ParseError::ParamFail { .. })));
    }

    #[test]
    fn quoted_string_unescaped() {
        let tree = sample();
        let req = run(&tree, r#"exec "echo a b""#).unwrap();
        assert_eq!(req.str("cmd"), Some("echo a b"));
        let req = run(&tree, r#"exec "say \"hi\" \n""#).unwrap();
        assert_eq!(req.str("cmd"), Some(r#"say "hi" \n"#));
    }

    #[test]
    fn quoted_token_only_matches_text_node() {
        let tree = sample();
        assert_eq!(
            run(&tree, r#""show" version"#).unwrap_err(),
            ParseError::NotFound { position: 0 }
        );
    }

    #[test]
    fn string_length_limit_uses_unquoted_text() {
        let tree = sample();
        assert_eq!(run(&tree, r#"name "abcd""#).unwrap().str("name"), Some("abcd"));
        assert!(matches!(run(&tree, "name abcde"), Err(ParseError::ParamFail { .. })));
    }

    #[test]
    fn weekday_and_time_captured() {
        let tree = sample();
        let req = run(&tree, "at fri 09:30").unwrap();
        assert_eq!(req.int("day"), Some(5));
        assert_eq!(req.time("when"), Some((9, 30)));
        assert!(matches!(run(&tree, "at fri 24:00"), Err(ParseError::ParamFail { .. })));
        assert!(matches!(run(&tree, "at fri 12:60"), Err(ParseError::ParamFail { .. })));
        assert!(matches!(run(&tree, "at fri 12"), Err(ParseError::ParamFail { .. })));
        assert!(matches!(run(&tree, "at xyz 12:00"), Err(ParseError::ParamFail { .. })));
    }

    #[test]
    fn keyword_id_stores_value() {
        let tree = sample();
        assert_eq!(run(&tree, "level h").unwrap().int("lvl"), Some(2));
    }

    #[test]
    fn if_else_follows_request_state() {
        let tree = tree_for(
            CFG,
            vec![Node::keyword("retry", "").then([
                Node::if_else(|req| req.negated()).then([Node::end(ok)]),
                Node::number("count", 1, 10, "").then([Node::end(ok)]),
            ])],
        );
        let mut req = Request::new(CFG);
        let tokens = tokenize("no retry", 64).unwrap();
        let head = parse(&tree, &mut req, &tokens).unwrap();
        assert!(req.negated());
        resolve_end(&tree, &req, head).unwrap();

        let mut req = Request::new(CFG);
        let tokens = tokenize("retry", 64).unwrap();
        let head = parse(&tree, &mut req, &tokens).unwrap();
        assert_eq!(resolve_end(&tree, &req, head).unwrap_err(), ParseError::Incomplete);
    }

    #[test]
    fn unquote_rules() {
        assert_eq!(unquote(r#""a b""#), "a b");
        assert_eq!(unquote(r"a\\b"), r"a\b");
        assert_eq!(unquote(r"a\tb"), r"a\tb");
        assert_eq!(unquote(r"a\ b"), r"a\ b");
        assert_eq!(unquote(r#""""#), "");
    }

    #[test]
    fn render_places_caret_after_prompt() {
        let err = ParseError::NotFound { position: 5 };
        assert_eq!(
            err.render("show bogus", 7),
            "            ^\nUnrecognized command.\n\n"
        );
        assert_eq!(
            ParseError::Incomplete.render("show", 7),
            "Incomplete command.\n\n"
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn number_accepts_exactly_its_range(min in 0i64..500, span in 0i64..500, n in 0i64..1200) {
                let max = min + span;
                let tree = tree_for(
                    TOP,
                    vec![Node::keyword("n", "").then([Node::number("v", min, max, "").then([Node::end(ok)])])],
                );
                let got = run(&tree, &format!("n {n}"));
                if (min..=max).contains(&n) {
                    prop_assert_eq!(got.unwrap().int("v"), Some(n));
                } else {
                    prop_assert_eq!(got.unwrap_err(), ParseError::ParamFail { position: 2 });
                }
            }

            #[test]
            fn non_digit_tokens_never_parse_as_numbers(s in "[0-9]*[a-z+-][0-9a-z]*") {
                prop_assert_eq!(parse_number(&s), None);
            }
        }
    }
}
