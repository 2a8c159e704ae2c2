// src/trigger/registry.rs

//! Trigger registry
//!
//! The built-in registry is a fixed table of packages known to break the
//! ABI of their dependents. It is merged at lookup time with the user's
//! configuration (`[triggers.<name>]` tables) and trigger override files,
//! which can both add triggers and change a built-in's threshold or scheme.

use crate::config::Config;
use crate::error::Result;
use crate::overrides::{Override, OverrideDirs};
use crate::version::{Scheme, Threshold};
use std::collections::BTreeMap;
use std::fmt;

/// Version of the built-in trigger table
///
/// Bumped whenever a built-in trigger is added, removed or changed.
pub const REGISTRY_VERSION: u32 = 1;

/// A built-in trigger definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerDef {
    pub name: &'static str,
    pub scheme: Scheme,
    pub threshold: Threshold,
}

const fn semver(name: &'static str, threshold: Threshold) -> TriggerDef {
    TriggerDef {
        name,
        scheme: Scheme::Semver,
        threshold,
    }
}

/// Built-in triggers, sorted by name
pub const BUILTIN_TRIGGERS: &[TriggerDef] = &[
    TriggerDef {
        name: "abseil-cpp",
        scheme: Scheme::NonSemver,
        threshold: Threshold::Always,
    },
    semver("boost", Threshold::Minor),
    semver("electron", Threshold::Major),
    semver("gtk2", Threshold::Minor),
    semver("gtk3", Threshold::Minor),
    semver("gtk4", Threshold::Minor),
    semver("icu", Threshold::Major),
    semver("openssl", Threshold::Minor),
    semver("protobuf", Threshold::Patch),
    semver("python", Threshold::Minor),
    semver("qt5-base", Threshold::Minor),
    semver("qt6-base", Threshold::Minor),
];

/// Find a built-in trigger by name
pub fn builtin(name: &str) -> Option<&'static TriggerDef> {
    BUILTIN_TRIGGERS
        .binary_search_by(|def| def.name.cmp(name))
        .ok()
        .map(|idx| &BUILTIN_TRIGGERS[idx])
}

/// Where a trigger's registration comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Built-in table, possibly with a configured threshold or scheme
    Builtin,
    /// Added by the user (configuration table or trigger override file)
    User,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Builtin => write!(f, "built-in"),
            Origin::User => write!(f, "user"),
        }
    }
}

/// A trigger with its effective settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveTrigger {
    pub name: String,
    pub scheme: Scheme,
    pub threshold: Threshold,
    pub origin: Origin,
    /// The configuration changed the built-in threshold or scheme
    pub customized: bool,
}

/// Lookup view over the built-in table, configuration and override files
pub struct TriggerRegistry<'a> {
    config: &'a Config,
    overrides: &'a OverrideDirs,
}

impl<'a> TriggerRegistry<'a> {
    pub fn new(config: &'a Config, overrides: &'a OverrideDirs) -> Self {
        Self { config, overrides }
    }

    /// Look up a trigger by name
    ///
    /// Returns `None` for packages that are not triggers.
    pub fn lookup(&self, name: &str) -> Result<Option<EffectiveTrigger>> {
        if let Some(def) = builtin(name) {
            return Ok(Some(self.merge_builtin(def)));
        }

        if self.config.triggers.contains_key(name)
            || self.overrides.trigger_override(name)? != Override::Unset
        {
            return Ok(Some(self.user_trigger(name)));
        }

        Ok(None)
    }

    /// Every registered trigger, sorted by name
    pub fn all(&self) -> Result<Vec<EffectiveTrigger>> {
        let mut triggers: BTreeMap<String, EffectiveTrigger> = BUILTIN_TRIGGERS
            .iter()
            .map(|def| (def.name.to_string(), self.merge_builtin(def)))
            .collect();

        let user_names = self
            .config
            .triggers
            .keys()
            .cloned()
            .chain(self.overrides.user_triggers()?);
        for name in user_names {
            if !triggers.contains_key(&name) {
                let trigger = self.user_trigger(&name);
                triggers.insert(name, trigger);
            }
        }

        Ok(triggers.into_values().collect())
    }

    fn merge_builtin(&self, def: &TriggerDef) -> EffectiveTrigger {
        let settings = self.config.triggers.get(def.name);
        let threshold = settings.and_then(|s| s.threshold).unwrap_or(def.threshold);
        let scheme = settings.and_then(|s| s.scheme).unwrap_or(def.scheme);

        EffectiveTrigger {
            name: def.name.to_string(),
            scheme,
            threshold,
            origin: Origin::Builtin,
            customized: threshold != def.threshold || scheme != def.scheme,
        }
    }

    fn user_trigger(&self, name: &str) -> EffectiveTrigger {
        let settings = self.config.triggers.get(name);
        EffectiveTrigger {
            name: name.to_string(),
            scheme: settings.and_then(|s| s.scheme).unwrap_or_default(),
            threshold: settings
                .and_then(|s| s.threshold)
                .unwrap_or(self.config.version_threshold),
            origin: Origin::User,
            customized: false,
        }
    }
}
