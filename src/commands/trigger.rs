// src/commands/trigger.rs

//! Trigger commands: evaluate upgrades, show the registry

use super::{Context, read_stdin_lines};
use anyhow::Result;
use rekindle::packages::PacmanSource;
use rekindle::trigger::registry::{REGISTRY_VERSION, TriggerRegistry};
use rekindle::trigger::{TriggerEngine, Upgrade};
use tracing::info;

/// Evaluate upgraded packages and mark what their triggers affect
///
/// Upgrades come from the arguments, or one per line from stdin (the pacman
/// hook passes them that way). A malformed line aborts the whole batch.
pub fn cmd_trigger(ctx: &Context, dry_run: bool, upgrades: Vec<String>) -> Result<()> {
    let lines = if upgrades.is_empty() {
        read_stdin_lines()?
    } else {
        upgrades
    };

    let upgrades = Upgrade::parse_lines(&lines)?;
    if upgrades.is_empty() {
        info!("No upgrades to evaluate");
        return Ok(());
    }

    let config = ctx.config()?;
    let overrides = ctx.overrides();
    let source = PacmanSource::new();
    let mut engine = TriggerEngine::new(&config, &overrides, &source);
    let report = engine.process(&upgrades)?;

    if !ctx.quiet {
        for below in &report.below_threshold {
            println!(
                "{}: {} change, below threshold {}",
                below.trigger, below.change, below.threshold
            );
        }
        for trigger in &report.suppressed {
            println!("{}: suppressed by override", trigger);
        }
    }

    if dry_run {
        for intent in &report.intents {
            println!("{} ({})", intent.package, intent.trigger);
        }
        ctx.status(&format!(
            "[DRY RUN] Would mark {} package(s)",
            report.packages().len()
        ));
        return Ok(());
    }

    if report.intents.is_empty() {
        ctx.status("No packages to mark");
        return Ok(());
    }

    let mut queue = ctx.open_queue(&config)?;
    let newly = engine.apply(&mut queue, &report)?;
    ctx.status(&format!(
        "Marked {} package(s) ({} newly queued)",
        report.packages().len(),
        newly
    ));
    Ok(())
}

/// List registered triggers with their effective settings
pub fn cmd_triggers(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let overrides = ctx.overrides();
    let triggers = TriggerRegistry::new(&config, &overrides).all()?;

    if ctx.quiet {
        for trigger in &triggers {
            println!("{}", trigger.name);
        }
        return Ok(());
    }

    println!("Trigger registry version {}", REGISTRY_VERSION);
    println!();
    println!("{:<25} {:<10} {:<11} {}", "NAME", "THRESHOLD", "SCHEME", "ORIGIN");
    println!("{}", "-".repeat(60));
    for trigger in &triggers {
        let origin = if trigger.customized {
            format!("{} (configured)", trigger.origin)
        } else {
            trigger.origin.to_string()
        };
        println!(
            "{:<25} {:<10} {:<11} {}",
            trigger.name, trigger.threshold, trigger.scheme, origin
        );
    }
    println!("\nTotal: {} trigger(s)", triggers.len());
    Ok(())
}
