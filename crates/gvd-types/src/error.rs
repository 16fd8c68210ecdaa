//! Error types for the GVD CLI.

use std::io;

/// Errors produced while assembling or running the CLI.
#[derive(Debug, thiserror::Error)]
pub enum GvdError {
    #[error("grammar error: {0}")]
    Grammar(String),

    #[error("mode error: {0}")]
    Mode(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("command error: {0}")]
    Command(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GvdError>;
