// src/db/paths.rs
//! Centralized path derivation for rekindle files

use std::path::{Path, PathBuf};

/// Default database location
pub const DEFAULT_DB_PATH: &str = "/var/lib/rekindle/rekindle.db";

/// Default configuration directory
pub const DEFAULT_CONF_DIR: &str = "/etc/rekindle";

/// Get the database path, honoring `REKINDLE_DB_PATH`
pub fn db_path() -> PathBuf {
    std::env::var_os("REKINDLE_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

/// Get the configuration directory, honoring `REKINDLE_CONF_DIR`
pub fn conf_dir() -> PathBuf {
    std::env::var_os("REKINDLE_CONF_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONF_DIR))
}

/// Get the configuration file inside a configuration directory
pub fn config_file(conf_dir: &Path) -> PathBuf {
    conf_dir.join("config.toml")
}

/// Get the directory of trigger-scoped override files
pub fn triggers_dir(conf_dir: &Path) -> PathBuf {
    conf_dir.join("triggers")
}

/// Get the directory of package-scoped override files
pub fn packages_dir(conf_dir: &Path) -> PathBuf {
    conf_dir.join("packages")
}
