//! Command-line interface module.
//!
//! This module provides the CLI structure and command handler for the deepbook binary.

mod commands;
mod run;

pub use commands::{Cli, OutputFormat};
pub use run::write_story;
