// src/main.rs

mod cli;
mod commands;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for a package that is not in the queue
const EXIT_NOT_FOUND: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            // ismarked reports a miss through its exit status alone
            if code != EXIT_NOT_FOUND || !is_silent_miss(&e) {
                eprintln!("error: {:#}", e);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.quiet && cli.command.needs_confirmation() {
        bail!("--quiet cannot answer a confirmation prompt; pass -f/--force");
    }

    let ctx = Context::new(cli.db_path, cli.conf_dir, cli.quiet);

    match cli.command {
        Commands::Mark {
            packages,
            trigger,
            trigger_version,
        } => commands::cmd_mark(
            &ctx,
            &packages,
            trigger.as_deref(),
            trigger_version.as_deref(),
        ),
        Commands::Unmark { packages, strict } => commands::cmd_unmark(&ctx, packages, strict),
        Commands::List { json } => commands::cmd_list(&ctx, json),
        Commands::Query { packages } => commands::cmd_query(&ctx, &packages),
        Commands::IsMarked { package } => commands::cmd_ismarked(&ctx, &package)
            .map_err(|e| e.context(SilentMiss)),
        Commands::Clear { force, trigger } => commands::cmd_clear(&ctx, force, trigger.as_deref()),
        Commands::Rebuild {
            force,
            checkrebuild,
            cmd,
            packages,
            helper_args,
        } => commands::cmd_rebuild(
            &ctx,
            force,
            checkrebuild,
            cmd.as_deref(),
            &packages,
            &helper_args,
        ),
        Commands::Trigger { dry_run, upgrades } => commands::cmd_trigger(&ctx, dry_run, upgrades),
        Commands::Triggers => commands::cmd_triggers(&ctx),
        Commands::Config => commands::cmd_config(&ctx),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}

/// Marker context for misses that should not print an error
#[derive(Debug)]
struct SilentMiss;

impl std::fmt::Display for SilentMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("not marked")
    }
}

fn is_silent_miss(err: &anyhow::Error) -> bool {
    err.downcast_ref::<SilentMiss>().is_some()
}

/// Map an error to the process exit status
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<rekindle::Error>() {
        Some(rekindle::Error::NotFound(_)) => EXIT_NOT_FOUND,
        _ => 1,
    }
}
