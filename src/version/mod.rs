// src/version/mod.rs

//! Version change classification and threshold evaluation
//!
//! Versions are reduced to a `major.minor.patch` triple before comparison:
//! - the suffix after the last `-` (pkgrel / build metadata) is dropped
//! - a leading `v` is dropped
//! - the remainder must be `NUM(.NUM){0,2}`; missing components are 0
//!
//! Anything else (epochs, `r123` snapshot tags, alpha segments) is
//! unparseable, and an unparseable change always fires.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Magnitude of a version change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Unchanged,
    Patch,
    Minor,
    Major,
    /// At least one side did not match the version grammar
    Unparseable,
}

impl Change {
    pub fn as_str(&self) -> &'static str {
        match self {
            Change::Unchanged => "unchanged",
            Change::Patch => "patch",
            Change::Minor => "minor",
            Change::Major => "major",
            Change::Unparseable => "unparseable",
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Minimum change magnitude that fires a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    Major,
    Minor,
    Patch,
    Always,
}

impl Threshold {
    pub fn as_str(&self) -> &'static str {
        match self {
            Threshold::Major => "major",
            Threshold::Minor => "minor",
            Threshold::Patch => "patch",
            Threshold::Always => "always",
        }
    }

    /// Whether a change of this magnitude fires under this threshold
    pub fn fires(&self, change: Change) -> bool {
        match change {
            Change::Unchanged => false,
            Change::Unparseable => true,
            Change::Major => true,
            Change::Minor => matches!(self, Threshold::Minor | Threshold::Patch | Threshold::Always),
            Change::Patch => matches!(self, Threshold::Patch | Threshold::Always),
        }
    }
}

impl FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Threshold::Major),
            "minor" => Ok(Threshold::Minor),
            "patch" => Ok(Threshold::Patch),
            "always" => Ok(Threshold::Always),
            other => Err(format!(
                "invalid threshold '{}', expected one of: major, minor, patch, always",
                other
            )),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Versioning scheme of a trigger package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    /// `major.minor.patch`-like versions, classified by component
    #[default]
    Semver,
    /// Date stamps, VCS snapshots and the like: any change is treated as unparseable
    NonSemver,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Semver => "semver",
            Scheme::NonSemver => "non-semver",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Parse a version string into a comparable triple
///
/// Returns `None` when the string does not match the grammar.
pub fn parse_version(input: &str) -> Option<Version> {
    let base = match input.rfind('-') {
        Some(idx) => &input[..idx],
        None => input,
    };
    let base = base.strip_prefix('v').unwrap_or(base);

    let mut parts = [0u64; 3];
    let mut count = 0;
    for component in base.split('.') {
        if count == 3 || component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parts[count] = component.parse().ok()?;
        count += 1;
    }

    Some(Version::new(parts[0], parts[1], parts[2]))
}

/// Classify the change between two version strings
///
/// The result ignores direction: a downgrade classifies like the
/// equivalent upgrade.
pub fn classify(old: &str, new: &str) -> Change {
    let (Some(old), Some(new)) = (parse_version(old), parse_version(new)) else {
        return Change::Unparseable;
    };

    if old.major != new.major {
        Change::Major
    } else if old.minor != new.minor {
        Change::Minor
    } else if old.patch != new.patch {
        Change::Patch
    } else {
        Change::Unchanged
    }
}

/// Classify a change according to a trigger's versioning scheme
pub fn classify_with_scheme(scheme: Scheme, old: &str, new: &str) -> Change {
    match scheme {
        Scheme::Semver => classify(old, new),
        Scheme::NonSemver if old == new => Change::Unchanged,
        Scheme::NonSemver => Change::Unparseable,
    }
}
