//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gridconf - Declarative cluster scheduler configuration manager.
#[derive(Parser, Debug)]
#[command(name = "gridconf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the desired configuration snapshot.
    #[arg(short, long, global = true, env = "GRIDCONF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the live state file.
    #[arg(long, global = true, env = "GRIDCONF_STATE")]
    pub state: Option<PathBuf>,

    /// Delay in milliseconds after every control plane call.
    #[arg(long, global = true, env = "GRIDCONF_DELAY_MS", default_value = "0")]
    pub delay_ms: u64,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the desired configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Compare two snapshot files.
    Diff {
        /// Old snapshot.
        old: PathBuf,

        /// New snapshot.
        new: PathBuf,
    },

    /// Generate and display the apply plan.
    Plan,

    /// Converge the live cluster onto the desired configuration.
    Apply {
        /// Only report the mutations that would be made.
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Check for drift between configuration and live cluster.
    Drift,

    /// Delete every live entity.
    Destroy {
        /// Attempt every deletion even after failures.
        #[arg(long)]
        continue_on_error: bool,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the live configuration.
    Show,

    /// Write the live configuration to a snapshot file.
    Export {
        /// Destination file (`.yaml`, `.yml` or `.json`).
        path: PathBuf,
    },

    /// Release the lock on the live state.
    Unlock {
        /// Lock ID to release.
        #[arg(long)]
        lock_id: Option<String>,

        /// Release whatever lock is held (dangerous).
        #[arg(long)]
        force: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Commands {
    /// Returns true if the command may mutate the live cluster.
    #[must_use]
    pub const fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Apply { dry_run: false, .. } | Self::Destroy { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::try_parse_from(["gridconf", "apply", "--dry-run", "--yes"]).expect("parses");
        assert!(matches!(cli.command, Commands::Apply { dry_run: true, yes: true }));
        assert!(!cli.command.mutates());
        assert_eq!(cli.delay_ms, 0);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gridconf",
            "destroy",
            "--continue-on-error",
            "--state",
            "/tmp/cluster.json",
            "--delay-ms",
            "250",
            "--output",
            "json",
        ])
        .expect("parses");

        assert!(cli.command.mutates());
        assert_eq!(cli.state, Some(PathBuf::from("/tmp/cluster.json")));
        assert_eq!(cli.delay_ms, 250);
        assert!(matches!(cli.output, OutputFormat::Json));
    }

    #[test]
    fn test_diff_requires_two_paths() {
        assert!(Cli::try_parse_from(["gridconf", "diff", "old.yaml"]).is_err());
        let cli =
            Cli::try_parse_from(["gridconf", "diff", "old.yaml", "new.yaml"]).expect("parses");
        assert!(matches!(cli.command, Commands::Diff { .. }));
    }
}
