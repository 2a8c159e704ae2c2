// src/commands/queue.rs

//! Queue commands: mark, unmark, list, query, ismarked, clear

use super::{Context, confirm, partition_names, read_stdin_lines, report_invalid};
use anyhow::Result;
use rekindle::Error;
use rekindle::name::{self, PackageName};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// Mark packages for rebuild
pub fn cmd_mark(
    ctx: &Context,
    packages: &[String],
    trigger: Option<&str>,
    trigger_version: Option<&str>,
) -> Result<()> {
    // Validate everything before writing anything
    let packages = name::parse_all(packages)?;
    let trigger = trigger.map(PackageName::parse).transpose()?;

    let config = ctx.config()?;
    let mut queue = ctx.open_queue(&config)?;
    let newly = queue.mark_many(&packages, trigger.as_ref(), trigger_version)?;

    let cause = match &trigger {
        Some(t) => format!(", trigger: {}", t),
        None => String::new(),
    };
    ctx.status(&format!(
        "Marked {} package(s) for rebuild ({} newly queued{})",
        packages.len(),
        newly,
        cause
    ));
    Ok(())
}

/// Remove packages from the queue
///
/// Invalid names are reported and skipped; the valid ones are still unmarked.
pub fn cmd_unmark(ctx: &Context, packages: Vec<String>, strict: bool) -> Result<()> {
    let raw: Vec<String> = if packages.is_empty() {
        read_stdin_lines()?
            .iter()
            .flat_map(|line| line.split_whitespace())
            .map(str::to_string)
            .collect()
    } else {
        packages
    };

    if raw.is_empty() {
        ctx.status("No packages specified");
        return Ok(());
    }

    let (valid, invalid) = partition_names(&raw);
    for name in &invalid {
        eprintln!("error: {}", Error::InvalidName(name.clone()));
    }

    if !valid.is_empty() {
        let config = ctx.config()?;
        let mut queue = ctx.open_queue(&config)?;

        match queue.unmark(&valid, strict) {
            Ok(outcome) => {
                ctx.status(&format!("Removed {} package(s)", outcome.removed.len()));
                if !outcome.missing.is_empty() {
                    info!("Not in queue: {}", outcome.missing.join(", "));
                }
            }
            Err(Error::NotFound(missing)) => {
                let requested: HashSet<&str> = valid.iter().map(PackageName::as_str).collect();
                ctx.status(&format!(
                    "Removed {} package(s)",
                    requested.len() - missing.len()
                ));
                return Err(Error::NotFound(missing).into());
            }
            Err(e) => return Err(e.into()),
        }
    }

    report_invalid(&invalid)
}

#[derive(Serialize)]
struct ListEntry<'a> {
    package: &'a str,
    first_marked_at: &'a str,
    trigger: Option<&'a str>,
    trigger_version: Option<&'a str>,
    marked_at: Option<&'a str>,
}

/// List queued packages
pub fn cmd_list(ctx: &Context, json: bool) -> Result<()> {
    let queue = ctx.open_queue_readonly()?;
    let queued = queue.list()?;

    if json {
        let entries: Vec<ListEntry> = queued
            .iter()
            .map(|q| {
                let latest = q.latest();
                ListEntry {
                    package: &q.package,
                    first_marked_at: &q.first_marked_at,
                    trigger: latest.and_then(|e| e.trigger_package.as_deref()),
                    trigger_version: latest.and_then(|e| e.trigger_version.as_deref()),
                    marked_at: latest.map(|e| e.marked_at.as_str()),
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if queued.is_empty() {
        ctx.status("No packages in queue");
        return Ok(());
    }

    if ctx.quiet {
        for q in &queued {
            println!("{}", q.package);
        }
        return Ok(());
    }

    println!("{:<35} {:<20} {}", "PACKAGE", "TRIGGER", "MARKED");
    println!("{}", "-".repeat(80));
    for q in &queued {
        let marked_at = q
            .latest()
            .map(|e| e.marked_at.as_str())
            .unwrap_or(q.first_marked_at.as_str());
        println!("{:<35} {:<20} {}", q.package, q.latest_cause(), marked_at);
    }
    println!("\nTotal: {} package(s) in queue", queued.len());
    Ok(())
}

/// Print which of the given packages are queued
pub fn cmd_query(ctx: &Context, packages: &[String]) -> Result<()> {
    let packages = name::parse_all(packages)?;
    let queue = ctx.open_queue_readonly()?;

    for package in queue.query(&packages)? {
        println!("{}", package);
    }
    Ok(())
}

/// Succeed if the package is queued; a miss maps to exit status 2
pub fn cmd_ismarked(ctx: &Context, package: &str) -> Result<()> {
    let package = PackageName::parse(package)?;
    let queue = ctx.open_queue_readonly()?;

    if queue.is_marked(&package)? {
        Ok(())
    } else {
        Err(Error::NotFound(vec![package.into_string()]).into())
    }
}

/// Clear the queue, or only the marks made by one trigger
pub fn cmd_clear(ctx: &Context, force: bool, trigger: Option<&str>) -> Result<()> {
    let trigger = trigger.map(PackageName::parse).transpose()?;

    let preview = ctx.open_queue_readonly()?.clear_preview(trigger.as_ref())?;
    if preview.is_empty() {
        ctx.status("Nothing to clear");
        return Ok(());
    }

    if !ctx.quiet {
        if preview.dequeued.is_empty() {
            println!("No packages leave the queue");
        } else {
            println!("Packages leaving the queue:");
            for package in &preview.dequeued {
                println!("  {}", package);
            }
        }
        println!("History events removed: {}", preview.events_removed);
    }

    if !force {
        let prompt = match &trigger {
            Some(t) => format!("Clear marks from trigger {}?", t),
            None => "Clear the entire queue?".to_string(),
        };
        if !confirm(&prompt)? {
            ctx.status("Cancelled");
            return Ok(());
        }
    }

    let config = ctx.config()?;
    let cleared = ctx.open_queue(&config)?.clear_commit(trigger.as_ref())?;
    ctx.status(&format!(
        "Cleared {} package(s) and {} history event(s)",
        cleared.dequeued.len(),
        cleared.events_removed
    ));
    Ok(())
}
