//! # Cli
//!
//! Command line parsing and the resolved runtime configuration.

// Re-export cli.rs
#[allow(clippy::module_inception)]
pub(crate) mod cli;
pub(crate) use cli::*;
