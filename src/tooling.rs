//! Tooling & Integration Layer
//!
//! Command-line front end over the configuration admin and output formatting.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, ConfigCommands, DocumentCommands};
