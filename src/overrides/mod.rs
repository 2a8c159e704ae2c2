// src/overrides/mod.rs

//! Override resolution
//!
//! Two kinds of override files adjust which packages a trigger marks:
//!
//! - `<conf_dir>/triggers/<trigger>.conf`: the packages this trigger marks,
//!   replacing the reverse-dependency lookup. An empty file suppresses the
//!   trigger entirely.
//! - `<conf_dir>/packages/<package>.conf`: the triggers allowed to mark this
//!   package. An empty file means no trigger ever marks it.
//!
//! Files list one pattern per line; blank lines and `#` comments are ignored.
//! Package-scoped overrides win over trigger-scoped ones. Files are read on
//! every lookup and never cached.

pub mod glob;

use crate::db::paths;
use crate::error::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of override files
pub const OVERRIDE_EXTENSION: &str = "conf";

/// State of one override file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Override {
    /// No file present
    Unset,
    /// File present with no patterns
    Empty,
    /// File present with patterns, in file order
    Patterns(Vec<String>),
}

impl Override {
    /// Build from file contents
    pub fn parse(contents: &str) -> Self {
        let patterns = parse_patterns(contents);
        if patterns.is_empty() {
            Self::Empty
        } else {
            Self::Patterns(patterns)
        }
    }
}

/// How a trigger's targets are determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPlan {
    /// Trigger override is empty: mark nothing
    Suppressed,
    /// Trigger override lists patterns to expand against eligible packages
    Explicit(Vec<String>),
    /// No trigger override: use reverse dependencies
    Default,
}

/// Extract patterns from override file contents
///
/// Inline comments are stripped, so `foo  # needs rebuild` yields `foo`.
pub fn parse_patterns(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        })
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Locations of the two override directories
#[derive(Debug, Clone)]
pub struct OverrideDirs {
    triggers: PathBuf,
    packages: PathBuf,
}

impl OverrideDirs {
    /// Override directories under a configuration directory
    pub fn new(conf_dir: &Path) -> Self {
        Self {
            triggers: paths::triggers_dir(conf_dir),
            packages: paths::packages_dir(conf_dir),
        }
    }

    /// Read the trigger-scoped override for `trigger`
    pub fn trigger_override(&self, trigger: &str) -> Result<Override> {
        read_override(&override_path(&self.triggers, trigger))
    }

    /// Read the package-scoped override for `package`
    pub fn package_override(&self, package: &str) -> Result<Override> {
        read_override(&override_path(&self.packages, package))
    }

    /// Decide how to find the packages a trigger marks
    pub fn resolve_targets(&self, trigger: &str) -> Result<ResolutionPlan> {
        let plan = match self.trigger_override(trigger)? {
            Override::Unset => ResolutionPlan::Default,
            Override::Empty => ResolutionPlan::Suppressed,
            Override::Patterns(patterns) => ResolutionPlan::Explicit(patterns),
        };
        debug!("Resolution plan for {}: {:?}", trigger, plan);
        Ok(plan)
    }

    /// Check whether a package's own override lets `trigger` mark it
    pub fn package_allows(&self, package: &str, trigger: &str) -> Result<bool> {
        let allowed = match self.package_override(package)? {
            Override::Unset => true,
            Override::Empty => false,
            Override::Patterns(patterns) => patterns.iter().any(|p| glob::matches(p, trigger)),
        };
        if !allowed {
            debug!("Package override for {} rejects trigger {}", package, trigger);
        }
        Ok(allowed)
    }

    /// Trigger names that have an override file, sorted
    ///
    /// Each such trigger is registered even if it is not built in.
    pub fn user_triggers(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.triggers) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {}",
                    self.triggers.display(),
                    e
                )));
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(OVERRIDE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                && crate::name::PackageName::parse(stem).is_ok()
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn override_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, OVERRIDE_EXTENSION))
}

fn read_override(path: &Path) -> Result<Override> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Override::parse(&contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Override::Unset),
        Err(e) => Err(Error::Config(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}
