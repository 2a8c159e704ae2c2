// src/commands/rebuild.rs

//! Rebuild command

use super::{Context, confirm, partition_names, report_invalid};
use anyhow::Result;
use rekindle::Error;
use rekindle::packages::{Checkrebuild, LinkageDetector};
use rekindle::rebuild::{RebuildPlan, detect_helper};
use tracing::{info, warn};

/// Rebuild queued packages with an AUR helper
///
/// Queue entries are only removed after the helper exits successfully.
pub fn cmd_rebuild(
    ctx: &Context,
    force: bool,
    checkrebuild: bool,
    cmd: Option<&str>,
    packages: &[String],
    helper_args: &[String],
) -> Result<()> {
    let config = ctx.config()?;
    let helper = detect_helper(&config, cmd)?;
    info!("Using helper: {}", helper.command);

    let (requested, invalid) = partition_names(packages);
    for name in &invalid {
        eprintln!("error: {}", Error::InvalidName(name.clone()));
    }
    // Only rejected names: do not fall back to the whole queue
    if !invalid.is_empty() && requested.is_empty() {
        return report_invalid(&invalid);
    }

    let queued = ctx.open_queue_readonly()?.package_names()?;

    let linkage = if checkrebuild || config.include_checkrebuild {
        match Checkrebuild.broken_packages() {
            Ok(found) => found,
            Err(e) => {
                warn!("Broken linkage detection failed: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let plan = RebuildPlan::new(&queued, &requested, force, linkage);
    if plan.is_empty() {
        ctx.status("Nothing to rebuild");
        return report_invalid(&invalid);
    }

    let targets = plan.targets();
    if !ctx.quiet {
        println!("Packages to rebuild ({}):", targets.len());
        for package in &plan.from_queue {
            println!("  {}", package);
        }
        for package in &plan.forced {
            println!("  {} (not queued)", package);
        }
        for package in &plan.from_linkage {
            println!("  {} (broken linkage)", package);
        }
    }

    if !force && !confirm(&format!("Rebuild with {}?", helper.command))? {
        ctx.status("Cancelled");
        return Ok(());
    }

    helper.run(&targets, helper_args)?;

    let mut queue = ctx.open_queue(&config)?;
    let removed = queue.rebuild_confirm(&plan.confirmable())?;
    ctx.status(&format!(
        "Rebuilt {} package(s), {} removed from the queue",
        targets.len(),
        removed
    ));
    report_invalid(&invalid)
}
