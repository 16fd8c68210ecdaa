//! Foundation types shared by the GVD CLI crates.
//!
//! Holds the workspace error enum and the TOML-backed CLI configuration.

pub mod config;
pub mod error;
