//! Context help: collecting admissible continuations and laying them out.

use std::cmp::Ordering;
use std::fmt;

use crate::node::NodeKind;
use crate::parser::{Chain, keyword_prefix};
use crate::session::Request;
use crate::tree::{CommandTree, NodeId};

/// Layout settings for help listings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub width: usize,
    pub indent: usize,
}

/// Candidates at `head` matching `filter`, in display order: help
/// suppliers first, `<cr>` last, everything else by label.
///
/// An empty filter admits every real node; otherwise only keywords the
/// filter abbreviates qualify.
pub(crate) fn collect(tree: &CommandTree, req: &Request, head: NodeId, filter: &str) -> Vec<NodeId> {
    let mut picked: Vec<NodeId> = Chain::new(tree, req, head)
        .filter(|&id| {
            let node = tree.node(id);
            match node.kind {
                NodeKind::Dead | NodeKind::IfElse { .. } => false,
                _ if filter.is_empty() => true,
                _ => node.kind.is_keyword() && keyword_prefix(&node.label, filter),
            }
        })
        .collect();
    picked.sort_by(|&a, &b| display_order(tree, a, b));
    picked
}

fn display_order(tree: &CommandTree, a: NodeId, b: NodeId) -> Ordering {
    let rank = |id: NodeId| match tree.node(id).kind {
        NodeKind::Help { .. } => 0,
        NodeKind::End { .. } => 2,
        _ => 1,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| tree.node(a).label.cmp(&tree.node(b).label))
}

/// Render a help listing for `picked`, headed by `mode_name`.
///
/// A help supplier at the head is printed as its text followed by whatever
/// the supplier writes into `req`. A failing supplier fails the listing.
pub(crate) fn render(
    tree: &CommandTree,
    req: &mut Request,
    picked: &[NodeId],
    mode_name: &str,
    layout: Layout,
) -> Result<String, fmt::Error> {
    let mut out = format!("{mode_name} commands:\n");
    let mut rest = picked;

    if let Some((&first, tail)) = picked.split_first()
        && let NodeKind::Help { supplier } = &tree.node(first).kind
    {
        let text = &tree.node(first).help;
        if !text.is_empty() {
            out.push_str(text);
            out.push('\n');
        }
        supplier(req)?;
        out.push_str(&req.take_output());
        rest = tail;
    }

    let widest = picked
        .iter()
        .map(|&id| tree.node(id).label.chars().count())
        .max()
        .unwrap_or(0);
    let pad = " ".repeat(layout.indent);
    let column = widest + layout.indent * 2;
    for &id in rest {
        let node = tree.node(id);
        out.push_str(&pad);
        out.push_str(&node.label);
        out.push_str(&" ".repeat(widest - node.label.chars().count()));
        out.push_str(&pad);
        out.push_str(&wrap(&node.help, column, layout.width));
    }
    out.push('\n');
    Ok(out)
}

/// Word-wrap `text` into lines fitting between `indent` and `width`.
///
/// The first line is assumed to already sit at `indent`; continuation
/// lines are prefixed with `indent` spaces. Words longer than the room
/// available are hard-cut.
pub(crate) fn wrap(text: &str, indent: usize, width: usize) -> String {
    if text.is_empty() {
        return "\n".to_string();
    }
    if indent >= width {
        return format!("{text}\n");
    }

    let room = width - indent;
    let mut out = String::new();
    let mut rest: Vec<char> = text.chars().collect();
    let mut first = true;
    while !rest.is_empty() {
        if !first {
            out.push_str(&" ".repeat(indent));
        }
        first = false;

        if rest.len() <= room {
            out.extend(rest.iter());
            out.push('\n');
            break;
        }

        // Last space at or before the column just past the room.
        let (line_end, next) = match (1..=room).rev().find(|&i| rest[i] == ' ') {
            None => (room, room),
            Some(space) => {
                let end = (1..=space).rev().find(|&i| rest[i - 1] != ' ').unwrap_or(0);
                let next = (space..rest.len())
                    .find(|&i| rest[i] != ' ')
                    .unwrap_or(rest.len());
                (end, next)
            },
        };
        out.extend(rest[..line_end].iter());
        out.push('\n');
        rest.drain(..next);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{ModeDef, ModeId, ModeTable};
    use crate::node::Node;
    use crate::session::Signal;
    use std::fmt::Write;

    const TOP: ModeId = ModeId::new("top");

    fn ok(_: &mut Request) -> gvd_types::error::Result<Signal> {
        Ok(Signal::Continue)
    }

    fn tree(chain: Vec<Node>) -> CommandTree {
        let modes = ModeTable::new(vec![ModeDef::apex(TOP, "Exec")]).unwrap();
        CommandTree::freeze(chain, modes.get(TOP).unwrap())
    }

    const LAYOUT: Layout = Layout {
        width: 80,
        indent: 2,
    };

    #[test]
    fn wrap_short_text_single_line() {
        assert_eq!(wrap("System time", 10, 80), "System time\n");
    }

    #[test]
    fn wrap_empty_text_is_blank_line() {
        assert_eq!(wrap("", 10, 80), "\n");
    }

    #[test]
    fn wrap_breaks_on_last_space() {
        assert_eq!(wrap("aaa bbb ccc", 4, 11), "aaa bbb\n    ccc\n");
        assert_eq!(wrap("aaa bbb ccc", 4, 9), "aaa\n    bbb\n    ccc\n");
    }

    #[test]
    fn wrap_exact_fit_breaks_at_following_space() {
        assert_eq!(wrap("abcd efgh", 0, 4), "abcd\nefgh\n");
    }

    #[test]
    fn wrap_trims_runs_of_spaces() {
        assert_eq!(wrap("ab   cdefgh", 0, 6), "ab\ncdefgh\n");
    }

    #[test]
    fn wrap_hard_cuts_long_words() {
        assert_eq!(wrap("abcdefghij", 2, 6), "abcd\n  efgh\n  ij\n");
    }

    #[test]
    fn collect_orders_labels_with_cr_last() {
        let t = tree(vec![Node::keyword("logfile", "").then([
            Node::keyword("flush", "").then([Node::end(ok)]),
            Node::keyword("clear", "").then([Node::end(ok)]),
            Node::end(ok),
        ])]);
        let req = Request::new(TOP);
        let head = t.node(t.root()).accept();
        let labels: Vec<&str> = collect(&t, &req, head, "")
            .into_iter()
            .map(|id| t.node(id).label())
            .collect();
        assert_eq!(labels, vec!["clear", "flush", "<cr>"]);
    }

    #[test]
    fn collect_filter_only_admits_keywords() {
        let t = tree(vec![
            Node::keyword("show", "").then([Node::end(ok)]),
            Node::keyword("shell", "").then([Node::end(ok)]),
            Node::text("s", "").then([Node::end(ok)]),
        ]);
        let req = Request::new(TOP);
        let labels: Vec<&str> = collect(&t, &req, t.root(), "SH")
            .into_iter()
            .map(|id| t.node(id).label())
            .collect();
        assert_eq!(labels, vec!["shell", "show"]);
    }

    #[test]
    fn render_aligns_and_wraps() {
        let t = tree(vec![
            Node::keyword("quit", "Exit the CLI").then([Node::end(ok)]),
            Node::keyword("configure", "Enter configuration mode").then([Node::end(ok)]),
        ]);
        let mut req = Request::new(TOP);
        let picked = collect(&t, &req, t.root(), "");
        let out = render(&t, &mut req, &picked, "Exec", LAYOUT).unwrap();
        assert_eq!(
            out,
            "Exec commands:\n  configure  Enter configuration mode\n  quit       Exit the CLI\n\n"
        );
    }

    #[test]
    fn render_help_supplier_first() {
        let t = tree(vec![Node::help("Days:", |req: &mut Request| {
            writeln!(req, "  Monday..Sunday")
        })
        .then([Node::week_day("day", "Day of week").then([Node::end(ok)])])]);
        let mut req = Request::new(TOP);
        let picked = collect(&t, &req, t.root(), "");
        let out = render(&t, &mut req, &picked, "Exec", LAYOUT).unwrap();
        assert_eq!(
            out,
            "Exec commands:\nDays:\n  Monday..Sunday\n  DAY  Day of week\n\n"
        );
    }

    #[test]
    fn render_fails_with_supplier() {
        let t = tree(vec![Node::help("", |_: &mut Request| Err(std::fmt::Error))
            .then([Node::week_day("day", "Day of week").then([Node::end(ok)])])]);
        let mut req = Request::new(TOP);
        let picked = collect(&t, &req, t.root(), "");
        assert!(render(&t, &mut req, &picked, "Exec", LAYOUT).is_err());
    }
}
