// src/rebuild/mod.rs

//! Rebuild orchestration
//!
//! Picks a rebuild helper, decides which packages to hand it, and runs it.
//! The helper is opaque: its exit status is the only success signal. Queue
//! entries are confirmed (unmarked) by the caller only after a successful run.

use crate::config::{Config, KNOWN_HELPERS};
use crate::error::{Error, Result};
use crate::name::PackageName;
use std::collections::HashSet;
use std::process::Command;
use tracing::{debug, info, warn};

/// How to invoke a rebuild helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperInvocation {
    /// Program to run
    pub command: String,
    /// Arguments placed before the package names
    pub base_args: Vec<String>,
}

impl HelperInvocation {
    /// Invocation for a helper with built-in support
    pub fn for_known_helper(name: &str) -> Self {
        let base_args = match name {
            "aura" => vec!["-A", "--rebuild"],
            _ => vec!["-S", "--rebuild"],
        };
        Self {
            command: name.to_string(),
            base_args: base_args.into_iter().map(str::to_string).collect(),
        }
    }

    /// Invocation from a custom command line such as `my-helper -S --rebuild`
    pub fn from_custom(cmd: &str) -> Option<Self> {
        let mut parts = cmd.split_whitespace();
        let command = parts.next()?.to_string();
        Some(Self {
            command,
            base_args: parts.map(str::to_string).collect(),
        })
    }

    /// Full argument list for a run
    pub fn args<'a>(&'a self, packages: &[&'a str], extra: &'a [String]) -> Vec<&'a str> {
        self.base_args
            .iter()
            .map(String::as_str)
            .chain(packages.iter().copied())
            .chain(extra.iter().map(String::as_str))
            .collect()
    }

    /// Run the helper in the foreground
    pub fn run(&self, packages: &[&str], extra: &[String]) -> Result<()> {
        let args = self.args(packages, extra);
        info!("Running: {} {}", self.command, args.join(" "));

        let status = Command::new(&self.command)
            .args(&args)
            .status()
            .map_err(|e| Error::external(&self.command, format!("failed to start: {}", e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::HelperFailed(status.code().unwrap_or(-1)))
        }
    }
}

/// Choose a helper: `--cmd` first, then the configured helper, then
/// the single known helper found on `PATH`
pub fn detect_helper(config: &Config, cmd_override: Option<&str>) -> Result<HelperInvocation> {
    detect_helper_with(config, cmd_override, |cmd| which::which(cmd).is_ok())
}

/// Helper detection with an injectable `PATH` lookup
pub fn detect_helper_with<F>(
    config: &Config,
    cmd_override: Option<&str>,
    in_path: F,
) -> Result<HelperInvocation>
where
    F: Fn(&str) -> bool,
{
    if let Some(cmd) = cmd_override.or(config.helper.as_deref()) {
        return resolve_helper(cmd, &in_path);
    }

    let found: Vec<&str> = KNOWN_HELPERS.iter().copied().filter(|h| in_path(*h)).collect();
    debug!("Detected helpers: {:?}", found);

    match found.as_slice() {
        [] => Err(Error::NoHelper(KNOWN_HELPERS.join(", "))),
        [helper] => Ok(HelperInvocation::for_known_helper(helper)),
        _ => Err(Error::AmbiguousHelper(
            found.into_iter().map(str::to_string).collect(),
        )),
    }
}

fn resolve_helper<F>(helper: &str, in_path: &F) -> Result<HelperInvocation>
where
    F: Fn(&str) -> bool,
{
    if Config::is_known_helper(helper) {
        if !in_path(helper) {
            return Err(Error::HelperNotFound(helper.to_string()));
        }
        return Ok(HelperInvocation::for_known_helper(helper));
    }

    let invocation = HelperInvocation::from_custom(helper)
        .ok_or_else(|| Error::Config("helper command is empty".to_string()))?;
    if !in_path(&invocation.command) {
        return Err(Error::HelperNotFound(invocation.command));
    }
    Ok(invocation)
}

/// Packages selected for a rebuild run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildPlan {
    /// Queued packages to rebuild; confirmed after success
    pub from_queue: Vec<String>,
    /// Requested packages that are not queued, included because of `-f`
    pub forced: Vec<String>,
    /// Packages reported by broken-linkage detection
    pub from_linkage: Vec<String>,
    /// Requested packages that were neither queued nor forced
    pub skipped: Vec<String>,
}

impl RebuildPlan {
    /// Select targets from the queue, explicit requests and linkage detection
    ///
    /// With no explicit requests every queued package is selected.
    pub fn new(
        queued: &[String],
        requested: &[PackageName],
        force: bool,
        linkage: Vec<String>,
    ) -> Self {
        let queued_set: HashSet<&str> = queued.iter().map(String::as_str).collect();
        let mut plan = Self::default();
        let mut seen: HashSet<String> = HashSet::new();

        if requested.is_empty() {
            for package in queued {
                if seen.insert(package.clone()) {
                    plan.from_queue.push(package.clone());
                }
            }
        } else {
            for package in requested {
                let package = package.as_str();
                if !seen.insert(package.to_string()) {
                    continue;
                }
                if queued_set.contains(package) {
                    plan.from_queue.push(package.to_string());
                } else if force {
                    plan.forced.push(package.to_string());
                } else {
                    warn!("{} is not in the queue, skipping (use -f to force)", package);
                    plan.skipped.push(package.to_string());
                }
            }
        }

        for package in linkage {
            if seen.insert(package.clone()) {
                plan.from_linkage.push(package);
            }
        }

        plan
    }

    /// Every package to pass to the helper, without duplicates
    pub fn targets(&self) -> Vec<&str> {
        self.from_queue
            .iter()
            .chain(&self.forced)
            .chain(&self.from_linkage)
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.from_queue.is_empty() && self.forced.is_empty() && self.from_linkage.is_empty()
    }

    /// Queued packages to unmark once the helper succeeds
    pub fn confirmable(&self) -> Vec<PackageName> {
        self.from_queue
            .iter()
            .filter_map(|p| PackageName::parse(p).ok())
            .collect()
    }
}
