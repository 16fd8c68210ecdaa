//! CLI configuration loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GvdError, Result};

/// Runtime settings for the CLI engine and its console front end.
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// working configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    /// Host name shown in the prompt. `None` asks the platform.
    #[serde(default)]
    pub hostname: Option<String>,
    /// Maximum number of tokens accepted on one line.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Column at which help text wraps.
    #[serde(default = "default_line_width")]
    pub line_width: usize,
    /// Spaces before a keyword and between keyword and help text.
    #[serde(default = "default_help_indent")]
    pub help_indent: usize,
    /// File that `logfile flush` writes the console transcript to.
    #[serde(default = "default_logfile")]
    pub logfile: PathBuf,
    /// Print the startup banner.
    #[serde(default = "yes")]
    pub banner: bool,
}

fn default_max_tokens() -> usize {
    64
}
fn default_line_width() -> usize {
    80
}
fn default_help_indent() -> usize {
    2
}
fn default_logfile() -> PathBuf {
    PathBuf::from("gvd.log")
}
fn yes() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            max_tokens: default_max_tokens(),
            line_width: default_line_width(),
            help_indent: default_help_indent(),
            logfile: default_logfile(),
            banner: true,
        }
    }
}

impl CliConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn resolve(path: &Path) -> Result<Self> {
        if path.is_file() {
            return Self::load(path);
        }
        log::warn!(
            "Config '{}' not found -- using defaults",
            path.display()
        );
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(GvdError::Config("max_tokens must be at least 1".into()));
        }
        // Room for the indent, a one-character keyword, the gap and some text.
        if self.line_width <= self.help_indent * 2 + 1 {
            return Err(GvdError::Config(format!(
                "line_width {} too narrow for help_indent {}",
                self.line_width, self.help_indent
            )));
        }
        Ok(())
    }
}
