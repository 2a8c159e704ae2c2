// src/config.rs

//! Configuration loading
//!
//! The configuration is a small TOML file of flat keys plus optional
//! per-trigger tables:
//!
//! ```toml
//! version_threshold = "minor"
//! helper = "paru"
//! include_checkrebuild = false
//! retention_days = 90
//!
//! [triggers.qt6-base]
//! threshold = "patch"
//!
//! [triggers.my-lib]
//! threshold = "major"
//! scheme = "semver"
//! ```
//!
//! A missing file yields the defaults; unknown keys are rejected.

use crate::error::{Error, Result};
use crate::version::{Scheme, Threshold};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Rebuild helpers with built-in invocation support, in detection order
pub const KNOWN_HELPERS: &[&str] = &["paru", "yay", "pikaur", "aura", "trizen"];

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Threshold for triggers that do not define their own
    pub version_threshold: Threshold,

    /// Helper command line (e.g. "paru" or "my-helper -S --rebuild"); unset means auto-detect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper: Option<String>,

    /// Include broken-linkage detection results in `rebuild` by default
    pub include_checkrebuild: bool,

    /// Days to keep trigger event history (0 keeps it forever)
    pub retention_days: u32,

    /// Per-trigger settings; names not in the built-in registry add new triggers
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub triggers: BTreeMap<String, TriggerSettings>,
}

/// User settings for a single trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version_threshold: Threshold::Minor,
            helper: None,
            include_checkrebuild: false,
            retention_days: 90,
            triggers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!("failed to read {}: {}", path.display(), e))),
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;

        // Blank helper means auto-detect
        if config.helper.as_deref().is_some_and(|h| h.trim().is_empty()) {
            config.helper = None;
        }

        for name in config.triggers.keys() {
            crate::name::PackageName::parse(name)
                .map_err(|_| Error::Config(format!("invalid trigger name '{}'", name)))?;
        }

        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check if a helper name has built-in invocation support
    pub fn is_known_helper(name: &str) -> bool {
        KNOWN_HELPERS.contains(&name)
    }
}
