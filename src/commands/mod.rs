// src/commands/mod.rs
//! Command handlers for the rekindle CLI

mod config;
mod queue;
mod rebuild;
mod trigger;

pub use config::{cmd_completions, cmd_config};
pub use queue::{cmd_clear, cmd_ismarked, cmd_list, cmd_mark, cmd_query, cmd_unmark};
pub use rebuild::cmd_rebuild;
pub use trigger::{cmd_trigger, cmd_triggers};

use anyhow::{Context as _, Result, bail};
use rekindle::config::Config;
use rekindle::db::paths;
use rekindle::name::PackageName;
use rekindle::overrides::OverrideDirs;
use rekindle::queue::RebuildQueue;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Settings shared by every command
pub struct Context {
    pub db_path: PathBuf,
    pub conf_dir: PathBuf,
    pub quiet: bool,
}

impl Context {
    /// Resolve paths from flags, falling back to the environment and defaults
    pub fn new(db_path: Option<PathBuf>, conf_dir: Option<PathBuf>, quiet: bool) -> Self {
        Self {
            db_path: db_path.unwrap_or_else(paths::db_path),
            conf_dir: conf_dir.unwrap_or_else(paths::conf_dir),
            quiet,
        }
    }

    pub fn config(&self) -> Result<Config> {
        let path = paths::config_file(&self.conf_dir);
        Config::load_from(&path).with_context(|| "failed to load configuration")
    }

    pub fn overrides(&self) -> OverrideDirs {
        OverrideDirs::new(&self.conf_dir)
    }

    /// Open the queue for writing
    pub fn open_queue(&self, config: &Config) -> Result<RebuildQueue> {
        RebuildQueue::open(&self.db_path, config.retention_days)
            .with_context(|| format!("failed to open database {}", self.db_path.display()))
    }

    /// Open the queue for reading
    pub fn open_queue_readonly(&self) -> Result<RebuildQueue> {
        RebuildQueue::open_readonly(&self.db_path)
            .with_context(|| format!("failed to open database {}", self.db_path.display()))
    }

    /// Print an informational line unless `--quiet` is set
    pub fn status(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` means no
pub fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Read non-empty lines from stdin
pub fn read_stdin_lines() -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Finish a partial-success command: fail if any names were skipped
pub fn report_invalid(invalid: &[String]) -> Result<()> {
    if invalid.is_empty() {
        return Ok(());
    }
    bail!(
        "skipped {} invalid package name(s): {}",
        invalid.len(),
        invalid.join(", ")
    )
}

/// Split raw names into valid ones and the rejected originals
pub fn partition_names(raw: &[String]) -> (Vec<PackageName>, Vec<String>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for name in raw {
        match PackageName::parse(name) {
            Ok(name) => valid.push(name),
            Err(_) => invalid.push(name.clone()),
        }
    }
    (valid, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_names() {
        let raw = vec!["Foo".to_string(), "bad/name".to_string(), "bar".to_string()];
        let (valid, invalid) = partition_names(&raw);
        assert_eq!(valid.iter().map(PackageName::as_str).collect::<Vec<_>>(), vec!["foo", "bar"]);
        assert_eq!(invalid, vec!["bad/name"]);
    }

    #[test]
    fn test_report_invalid() {
        assert!(report_invalid(&[]).is_ok());

        let err = report_invalid(&["bad/name".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "skipped 1 invalid package name(s): bad/name");
    }
}
