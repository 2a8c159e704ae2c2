// src/cli/mod.rs
//! CLI definitions for rekindle
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! Queue commands:
//! - `mark` / `unmark` - Add or remove packages
//! - `list` / `query` / `ismarked` - Inspect the queue
//! - `clear` - Empty the queue, or drop what one trigger contributed
//!
//! Trigger commands:
//! - `trigger` - Evaluate upgraded packages (pacman hook entry point)
//! - `triggers` - Show the registered triggers
//!
//! Other:
//! - `rebuild` - Rebuild queued packages with an AUR helper
//! - `config` - Show the effective configuration
//! - `completions` - Generate shell completions

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rekindle")]
#[command(version)]
#[command(about = "Track locally built packages that need a rebuild after library upgrades", long_about = None)]
pub struct Cli {
    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the database file [default: /var/lib/rekindle/rekindle.db]
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Configuration directory [default: /etc/rekindle]
    #[arg(long, global = true, value_name = "DIR")]
    pub conf_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mark packages for rebuild
    Mark {
        /// Packages to mark
        #[arg(required = true)]
        packages: Vec<String>,

        /// Record the mark as caused by this trigger package
        #[arg(long)]
        trigger: Option<String>,

        /// Version of the trigger package
        #[arg(long, requires = "trigger")]
        trigger_version: Option<String>,
    },

    /// Remove packages from the queue (reads stdin when no packages are given)
    Unmark {
        /// Packages to unmark
        packages: Vec<String>,

        /// Exit with status 2 if any package was not queued
        #[arg(long)]
        strict: bool,
    },

    /// List queued packages with the trigger that last marked them
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print which of the given packages are queued
    Query {
        /// Packages to check
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Exit 0 if a package is queued, 2 otherwise
    #[command(name = "ismarked")]
    IsMarked {
        /// Package to check
        package: String,
    },

    /// Clear the queue, or only the marks made by one trigger
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,

        /// Only clear what this trigger marked
        trigger: Option<String>,
    },

    /// Rebuild queued packages with an AUR helper
    Rebuild {
        /// Do not ask for confirmation; also allow packages that are not queued
        #[arg(short, long)]
        force: bool,

        /// Include packages with broken linkage reported by checkrebuild
        #[arg(long)]
        checkrebuild: bool,

        /// Helper command line to use instead of the configured or detected one
        #[arg(long, value_name = "COMMAND")]
        cmd: Option<String>,

        /// Packages to rebuild (default: the whole queue)
        packages: Vec<String>,

        /// Extra arguments passed to the helper after `--`
        #[arg(last = true)]
        helper_args: Vec<String>,
    },

    /// Evaluate upgraded packages against the trigger registry
    ///
    /// Each upgrade is `name old new`, `name:old:new` or a bare `name`.
    /// Reads one upgrade per line from stdin when none are given.
    Trigger {
        /// Show what would be marked without changing the queue
        #[arg(long)]
        dry_run: bool,

        /// Upgrades to evaluate
        upgrades: Vec<String>,
    },

    /// Show registered triggers and their thresholds
    Triggers,

    /// Show the effective configuration
    Config,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Whether this command would stop to ask for confirmation
    pub fn needs_confirmation(&self) -> bool {
        matches!(
            self,
            Commands::Clear { force: false, .. } | Commands::Rebuild { force: false, .. }
        )
    }
}
