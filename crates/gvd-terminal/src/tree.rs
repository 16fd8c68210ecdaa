//! Tree assembly: merging fragments, validating them, and freezing each
//! mode's grammar into an immutable arena.

use gvd_types::error::{GvdError, Result};

use crate::mode::{ModeDef, ModeTable};
use crate::node::{Node, NodeKind};
use crate::session::Signal;

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merge `fragment` into `base` and return the combined chain.
///
/// Nodes already present (same kind and literal) have their accept lists
/// merged recursively; new nodes are spliced in ahead of the first node
/// that ends chain enumeration. A terminal node in the fragment stops the
/// merge at its level.
pub fn merge(mut base: Vec<Node>, fragment: Vec<Node>) -> Vec<Node> {
    if base.is_empty() {
        return fragment;
    }
    for node in fragment {
        if node.kind.is_end() {
            log::debug!("merge stopped at <cr>");
            break;
        }
        match base.iter_mut().find(|b| b.kind.same_as(&node.kind)) {
            Some(existing) => {
                let accept = std::mem::take(&mut existing.accept);
                existing.accept = merge(accept, node.accept);
            },
            None => {
                let at = base
                    .iter()
                    .position(|b| ends_enumeration(&b.kind))
                    .unwrap_or(base.len());
                base.insert(at, node);
            },
        }
    }
    base
}

/// Kinds after which the alternate chain is never walked further.
fn ends_enumeration(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::End { .. } | NodeKind::IfElse { .. } | NodeKind::Help { .. }
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a declared chain for structural mistakes.
pub(crate) fn validate(chain: &[Node], modes: &ModeTable) -> Result<()> {
    validate_at(chain, modes, &mut Vec::new())
}

fn validate_at(chain: &[Node], modes: &ModeTable, path: &mut Vec<String>) -> Result<()> {
    for (i, node) in chain.iter().enumerate() {
        let terminal = matches!(node.kind, NodeKind::End { .. } | NodeKind::Help { .. });
        if terminal && i + 1 < chain.len() {
            return Err(GvdError::Grammar(format!(
                "unreachable node after {} node under {}",
                node.kind.name(),
                location(path)
            )));
        }
        match &node.kind {
            NodeKind::End { submode, .. } => {
                if !node.accept.is_empty() {
                    return Err(GvdError::Grammar(format!(
                        "<cr> under {} has a continuation",
                        location(path)
                    )));
                }
                if let Some(mode) = submode
                    && !modes.contains(*mode)
                {
                    return Err(GvdError::Mode(format!(
                        "<cr> under {} enters unknown mode {mode}",
                        location(path)
                    )));
                }
                continue;
            },
            NodeKind::Number { min, max, .. } if min > max => {
                return Err(GvdError::Grammar(format!(
                    "number under {} has empty range {min}-{max}",
                    location(path)
                )));
            },
            NodeKind::Dead => {
                return Err(GvdError::Grammar(format!(
                    "dead node declared under {}",
                    location(path)
                )));
            },
            _ => {},
        }
        if node.accept.is_empty() {
            return Err(GvdError::Grammar(format!(
                "{} node '{}' under {} has no continuation",
                node.kind.name(),
                node.label,
                location(path)
            )));
        }
        path.push(node.label.clone());
        validate_at(&node.accept, modes, path)?;
        path.pop();
    }
    Ok(())
}

fn location(path: &[String]) -> String {
    if path.is_empty() {
        "the root".to_string()
    } else {
        format!("'{}'", path.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Frozen tree
// ---------------------------------------------------------------------------

/// Index of a node inside a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The sentinel terminating every chain.
    pub const DEAD: NodeId = NodeId(0);

    pub fn is_dead(self) -> bool {
        self == Self::DEAD
    }
}

/// A node as stored in the arena.
#[derive(Debug)]
pub struct TreeNode {
    pub(crate) kind: NodeKind,
    pub(crate) label: String,
    pub(crate) help: String,
    pub(crate) accept: NodeId,
    pub(crate) alternate: NodeId,
}

impl TreeNode {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Keyword or placeholder shown in help.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn accept(&self) -> NodeId {
        self.accept
    }

    pub fn alternate(&self) -> NodeId {
        self.alternate
    }
}

/// The read-only grammar of one mode.
///
/// Nodes may be shared between paths (the "no" and "default" prefixes
/// both lead into the user command chain), which is why the tree is an
/// arena rather than owned boxes.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl CommandTree {
    fn empty() -> Self {
        Self {
            nodes: vec![TreeNode {
                kind: NodeKind::Dead,
                label: String::new(),
                help: String::new(),
                accept: NodeId::DEAD,
                alternate: NodeId::DEAD,
            }],
            root: NodeId::DEAD,
        }
    }

    /// Freeze a merged chain, adding the built-in navigation commands for
    /// every mode except the apex.
    pub(crate) fn freeze(roots: Vec<Node>, mode: &ModeDef) -> Self {
        let mut tree = Self::empty();
        let user_head = tree.push_chain(roots, NodeId::DEAD);
        tree.root = if mode.parent.is_some() {
            tree.augment(user_head, mode)
        } else {
            user_head
        };
        log::debug!("mode {}: {} nodes", mode.id, tree.len());
        tree
    }

    /// Prepend exit, end and (for configuration modes with commands) the
    /// no/default prefixes. Returns the new head.
    fn augment(&mut self, user_head: NodeId, mode: &ModeDef) -> NodeId {
        let mut head = user_head;
        if mode.config_style && !user_head.is_dead() {
            let default = self.push_node(Node::prefix_default(), user_head, user_head);
            head = self.push_node(Node::prefix_no(), user_head, default);
        }

        let end_cr = self.push_node(
            Node::end(|req| {
                req.end_mode();
                Ok(Signal::Continue)
            }),
            NodeId::DEAD,
            NodeId::DEAD,
        );
        head = self.push_node(Node::keyword("end", "Exit to Exec mode"), end_cr, head);

        let exit_cr = self.push_node(
            Node::end(|req| {
                req.exit_mode();
                Ok(Signal::Continue)
            }),
            NodeId::DEAD,
            NodeId::DEAD,
        );
        let exit_help = format!("Exit from {} mode", mode.name);
        self.push_node(Node::keyword("exit", &exit_help), exit_cr, head)
    }

    fn push_node(&mut self, node: Node, accept: NodeId, alternate: NodeId) -> NodeId {
        let label = match &node.kind {
            NodeKind::Number { min, max, .. } => format!("<{min}-{max}>"),
            _ => node.label,
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            kind: node.kind,
            label,
            help: node.help,
            accept,
            alternate,
        });
        id
    }

    /// Store `chain` so that its last node falls through to `tail`.
    fn push_chain(&mut self, chain: Vec<Node>, tail: NodeId) -> NodeId {
        let mut next = tail;
        for mut node in chain.into_iter().rev() {
            let accept = self.push_chain(std::mem::take(&mut node.accept), NodeId::DEAD);
            next = self.push_node(node, accept, next);
        }
        next
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Number of real nodes, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_dead()
    }

    /// Every command path in the tree, as space-joined labels.
    ///
    /// Both branches of an if-else are listed. Paths through the "no" and
    /// "default" prefixes are not repeated.
    pub fn commands(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(self.root, &mut Vec::new(), &mut out);
        out
    }

    fn collect_paths<'t>(&'t self, mut id: NodeId, path: &mut Vec<&'t str>, out: &mut Vec<String>) {
        while !id.is_dead() {
            let node = self.node(id);
            match &node.kind {
                NodeKind::End { .. } => {
                    out.push(path.join(" "));
                    return;
                },
                NodeKind::IfElse { .. } | NodeKind::Help { .. } => {
                    self.collect_paths(node.accept, path, out);
                    if matches!(node.kind, NodeKind::Help { .. }) {
                        return;
                    }
                },
                NodeKind::No | NodeKind::Default => {},
                _ => {
                    path.push(&node.label);
                    self.collect_paths(node.accept, path, out);
                    path.pop();
                },
            }
            id = node.alternate;
        }
    }
}
