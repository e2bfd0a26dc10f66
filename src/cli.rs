//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `mdstamp`.
#[derive(Debug, Parser)]
#[command(
    name = "mdstamp",
    version,
    about = "Stamp creation and modification times into Markdown frontmatter"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge the configured fields into each file's frontmatter.
    Stamp {
        /// Markdown files to stamp.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Use file times instead of git history.
        #[arg(long)]
        no_git: bool,
        /// Print the stamped documents instead of writing them.
        #[arg(long)]
        dry_run: bool,
        /// Config file (defaults to `.mdstamp.yaml` when present).
        #[arg(long, env = "MDSTAMP_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the resolved created and modified times of each file.
    Times {
        /// Files to inspect.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Use file times instead of git history.
        #[arg(long)]
        no_git: bool,
    },
}
