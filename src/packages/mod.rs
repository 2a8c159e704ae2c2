// src/packages/mod.rs

//! Package data sources
//!
//! The trigger engine never talks to the system package manager directly.
//! It goes through `PackageSource` and `LinkageDetector`, which the pacman
//! adapters implement and tests replace with fixed data.

pub mod pacman_query;

pub use pacman_query::{Checkrebuild, PacmanSource};

use crate::error::Result;

/// An installed package that was not installed from a sync repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    /// Package ships prebuilt binaries; rebuilding it gains nothing
    pub prebuilt: bool,
}

impl InstalledPackage {
    /// Create an entry, flagging prebuilt packages by their name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prebuilt: crate::overrides::glob::is_prebuilt_name(name),
        }
    }
}

/// Source of installed package information
pub trait PackageSource {
    /// Installed packages that depend on `package`, directly or transitively
    fn reverse_dependencies(&self, package: &str) -> Result<Vec<String>>;

    /// Installed foreign (locally built) packages
    fn foreign_packages(&self) -> Result<Vec<InstalledPackage>>;
}

/// Detector of packages with broken library linkage
pub trait LinkageDetector {
    fn broken_packages(&self) -> Result<Vec<String>>;
}
