//! Router-style command-line engine.
//!
//! Commands are declared as trees of grammar nodes, grouped into fragments
//! per mode. Fragments for the same mode are merged, then frozen into an
//! immutable [`CommandTree`] that the parser walks token by token. The same
//! trees drive context help (`?`) and tab completion.

mod cli;
mod commands;
mod complete;
mod gvd_commands;
mod help;
mod logfile_commands;
mod mode;
mod node;
mod parser;
mod session;
mod system_commands;
mod tokenizer;
mod tree;

#[cfg(test)]
pub(crate) mod test_utils;


/// The assembled engine and its builder.
pub use cli::{Cli, CliBuilder};
/// Standard modes, services and command registration.
pub use commands::{
    CONFIG, CONFIG_GVD, EXEC, SHELL, Services, register_builtins, standard_cli, standard_modes,
};
/// Result of a tab completion request.
pub use complete::Completion;
/// Mode hierarchy.
pub use mode::{ModeDef, ModeId, ModeTable, Transition};
/// Grammar declaration.
pub use node::{CommandFn, Fragment, HelpFn, Node, NodeKind, PredicateFn};
/// Why a line failed to parse.
pub use parser::ParseError;
/// Session and per-call request state.
pub use session::{Reply, Request, Session, Signal, Value};
/// Quote-aware line splitting.
pub use tokenizer::{SyntaxError, Token, tokenize};
/// Frozen command trees.
pub use tree::{CommandTree, NodeId, TreeNode, merge};
