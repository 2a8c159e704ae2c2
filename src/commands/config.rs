// src/commands/config.rs

//! Configuration and shell completion commands

use super::Context;
use crate::cli::Cli;
use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io;

/// Print the effective configuration as TOML
pub fn cmd_config(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    if !ctx.quiet {
        println!(
            "# {}",
            rekindle::db::paths::config_file(&ctx.conf_dir).display()
        );
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Write a completion script for `shell` to stdout
pub fn cmd_completions(shell: Shell) -> Result<()> {
    clap_complete::generate(shell, &mut Cli::command(), "rekindle", &mut io::stdout());
    Ok(())
}
