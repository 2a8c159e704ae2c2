// src/overrides/glob.rs

//! Pattern expansion against the eligible package set
//!
//! Only locally-built packages are eligible for marking. Prebuilt packages
//! (the `-bin` convention) are excluded before any pattern is evaluated, so
//! no pattern, however broad, can select them.

use crate::packages::InstalledPackage;
use ::glob::Pattern;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Suffix that marks a prebuilt package
pub const PREBUILT_SUFFIX: &str = "-bin";

/// Check the naming convention for prebuilt packages
pub fn is_prebuilt_name(name: &str) -> bool {
    name.ends_with(PREBUILT_SUFFIX)
}

/// Check whether a pattern uses glob syntax
pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Match a single name against a literal or glob pattern
///
/// Invalid glob syntax never matches.
pub fn matches(pattern: &str, name: &str) -> bool {
    if !has_wildcard(pattern) {
        return pattern == name;
    }

    match Pattern::new(pattern) {
        Ok(compiled) => compiled.matches(name),
        Err(e) => {
            debug!("Ignoring invalid pattern '{}': {}", pattern, e);
            false
        }
    }
}

/// Snapshot of packages that may be marked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibleSet {
    names: BTreeSet<String>,
}

impl EligibleSet {
    /// Build the set from installed foreign packages, dropping prebuilt ones
    pub fn new(installed: impl IntoIterator<Item = InstalledPackage>) -> Self {
        let names = installed
            .into_iter()
            .filter(|pkg| !pkg.prebuilt && !is_prebuilt_name(&pkg.name))
            .map(|pkg| pkg.name)
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Eligible names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Expand patterns into eligible package names
///
/// Literal patterns select only an exact eligible name. Wildcard patterns are
/// matched case-sensitively against every eligible name. Results follow
/// pattern order, then sorted name order, without duplicates. Patterns that
/// are invalid or match nothing contribute nothing.
pub fn expand(patterns: &[String], eligible: &EligibleSet) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for pattern in patterns {
        if !has_wildcard(pattern) {
            if eligible.contains(pattern) {
                if seen.insert(pattern.clone()) {
                    result.push(pattern.clone());
                }
            } else {
                debug!("Pattern '{}' names no eligible package", pattern);
            }
            continue;
        }

        let compiled = match Pattern::new(pattern) {
            Ok(compiled) => compiled,
            Err(e) => {
                debug!("Ignoring invalid pattern '{}': {}", pattern, e);
                continue;
            }
        };

        let before = result.len();
        for name in eligible.names() {
            if compiled.matches(name) && seen.insert(name.to_string()) {
                result.push(name.to_string());
            }
        }
        if result.len() == before {
            debug!("Pattern '{}' matched no new eligible package", pattern);
        }
    }

    result
}
