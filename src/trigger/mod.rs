// src/trigger/mod.rs

//! Trigger engine
//!
//! Turns a batch of package upgrades into mark intents:
//!
//! 1. Skip upgrades of packages that are not registered triggers
//! 2. Classify the version change and compare it to the trigger's threshold
//! 3. Resolve the affected packages (trigger override or reverse dependencies)
//! 4. Keep only eligible packages whose own override admits the trigger
//!
//! The engine does no writes itself. `TriggerEngine::apply` hands the
//! intents to the queue in a single transaction, so a batch is either fully
//! recorded or not at all.

pub mod registry;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::name::PackageName;
use crate::overrides::glob::{self, EligibleSet};
use crate::overrides::{OverrideDirs, ResolutionPlan};
use crate::packages::PackageSource;
use crate::queue::RebuildQueue;
use crate::version::{self, Change, Threshold};
use registry::TriggerRegistry;
use std::collections::HashSet;
use tracing::{debug, info};

/// One upgraded package, as reported by the package manager hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upgrade {
    pub name: PackageName,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
}

impl Upgrade {
    /// Parse one input line
    ///
    /// Accepted forms are `name old new`, `name:old:new` and a bare `name`.
    /// A line of `name new` records the new version without an old one.
    /// Returns `None` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (name, old, new) = match tokens.as_slice() {
            [single] if single.contains(':') => {
                let parts: Vec<&str> = single.splitn(3, ':').collect();
                match parts.as_slice() {
                    [name, old, new] if !old.is_empty() && !new.is_empty() => {
                        (*name, Some(*old), Some(*new))
                    }
                    _ => return Err(Error::InvalidUpgrade(line.to_string())),
                }
            }
            [name] => (*name, None, None),
            [name, new] => (*name, None, Some(*new)),
            [name, old, new] => (*name, Some(*old), Some(*new)),
            _ => return Err(Error::InvalidUpgrade(line.to_string())),
        };

        Ok(Some(Self {
            name: PackageName::parse(name)?,
            old_version: old.map(str::to_string),
            new_version: new.map(str::to_string),
        }))
    }

    /// Parse many lines, failing on the first malformed one
    pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Self>> {
        let mut upgrades = Vec::new();
        for line in lines {
            if let Some(upgrade) = Self::parse(line.as_ref())? {
                upgrades.push(upgrade);
            }
        }
        Ok(upgrades)
    }
}

/// A package to mark because a trigger fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkIntent {
    pub package: PackageName,
    pub trigger: PackageName,
    /// New version of the trigger, when known
    pub version: Option<String>,
}

/// A trigger whose version change stayed under its threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelowThreshold {
    pub trigger: String,
    pub change: Change,
    pub threshold: Threshold,
}

/// Outcome of evaluating a batch of upgrades
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Intents in input order, then resolution order
    pub intents: Vec<MarkIntent>,
    /// Upgraded packages that are not triggers
    pub not_triggers: Vec<String>,
    /// Triggers that did not fire
    pub below_threshold: Vec<BelowThreshold>,
    /// Triggers silenced by an empty override file
    pub suppressed: Vec<String>,
}

impl ProcessReport {
    /// Distinct packages to be marked, in intent order
    pub fn packages(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.intents
            .iter()
            .map(|intent| intent.package.as_str())
            .filter(|pkg| seen.insert(*pkg))
            .collect()
    }
}

/// Evaluates upgrades against the trigger registry
pub struct TriggerEngine<'a, S: PackageSource> {
    registry: TriggerRegistry<'a>,
    overrides: &'a OverrideDirs,
    source: &'a S,
    eligible: Option<EligibleSet>,
}

impl<'a, S: PackageSource> TriggerEngine<'a, S> {
    pub fn new(config: &'a Config, overrides: &'a OverrideDirs, source: &'a S) -> Self {
        Self {
            registry: TriggerRegistry::new(config, overrides),
            overrides,
            source,
            eligible: None,
        }
    }

    /// Evaluate a batch of upgrades
    ///
    /// Any collaborator failure aborts the whole batch.
    pub fn process(&mut self, upgrades: &[Upgrade]) -> Result<ProcessReport> {
        let mut report = ProcessReport::default();
        let mut seen: HashSet<(PackageName, PackageName)> = HashSet::new();

        for upgrade in upgrades {
            let trigger_name = upgrade.name.as_str();

            let Some(trigger) = self.registry.lookup(trigger_name)? else {
                debug!("{} is not a trigger", trigger_name);
                report.not_triggers.push(trigger_name.to_string());
                continue;
            };

            if let (Some(old), Some(new)) = (&upgrade.old_version, &upgrade.new_version) {
                let change = version::classify_with_scheme(trigger.scheme, old, new);
                if !trigger.threshold.fires(change) {
                    debug!(
                        "{} {} -> {} is a {} change, below threshold {}",
                        trigger_name, old, new, change, trigger.threshold
                    );
                    report.below_threshold.push(BelowThreshold {
                        trigger: trigger_name.to_string(),
                        change,
                        threshold: trigger.threshold,
                    });
                    continue;
                }
                debug!("{} {} -> {} fires ({} change)", trigger_name, old, new, change);
            }

            let candidates = match self.overrides.resolve_targets(trigger_name)? {
                ResolutionPlan::Suppressed => {
                    report.suppressed.push(trigger_name.to_string());
                    continue;
                }
                ResolutionPlan::Explicit(patterns) => glob::expand(&patterns, self.eligible()?),
                ResolutionPlan::Default => {
                    let reverse_deps = self.source.reverse_dependencies(trigger_name)?;
                    let eligible = self.eligible()?;
                    reverse_deps
                        .into_iter()
                        .filter(|dep| dep != trigger_name && eligible.contains(dep))
                        .collect()
                }
            };

            for candidate in candidates {
                if !self.overrides.package_allows(&candidate, trigger_name)? {
                    continue;
                }
                let package = match PackageName::parse(&candidate) {
                    Ok(package) => package,
                    Err(e) => {
                        debug!("Skipping {}: {}", candidate, e);
                        continue;
                    }
                };
                if seen.insert((package.clone(), upgrade.name.clone())) {
                    report.intents.push(MarkIntent {
                        package,
                        trigger: upgrade.name.clone(),
                        version: upgrade.new_version.clone(),
                    });
                }
            }
        }

        info!(
            "Processed {} upgrade(s): {} package(s) to mark",
            upgrades.len(),
            report.packages().len()
        );
        Ok(report)
    }

    /// Record a report's intents in the queue
    pub fn apply(&self, queue: &mut RebuildQueue, report: &ProcessReport) -> Result<usize> {
        queue.mark_batch(&report.intents)
    }

    /// Eligible packages, fetched on first use
    fn eligible(&mut self) -> Result<&EligibleSet> {
        if self.eligible.is_none() {
            let installed = self.source.foreign_packages()?;
            let set = EligibleSet::new(installed);
            debug!("{} eligible packages", set.len());
            self.eligible = Some(set);
        }
        Ok(self.eligible.get_or_insert_with(EligibleSet::default))
    }
}
