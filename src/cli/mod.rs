//! CLI module for the gridconf tool.
//!
//! This module provides the command-line interface for managing
//! cluster scheduler configuration.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
