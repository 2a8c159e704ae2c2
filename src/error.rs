// src/error.rs

//! Error types for rekindle

use thiserror::Error;

/// Errors produced by the rebuild queue, trigger engine and rebuild orchestration
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed package identifier
    #[error("invalid package name '{0}'")]
    InvalidName(String),

    /// Malformed upgrade line
    #[error("invalid upgrade '{0}': expected 'name old new', 'name:old:new' or 'name'")]
    InvalidUpgrade(String),

    /// One or more packages were not in the queue
    #[error("not in queue: {}", .0.join(", "))]
    NotFound(Vec<String>),

    /// Several rebuild helpers are installed and none is configured
    #[error("multiple rebuild helpers found: {}; set 'helper' in the configuration", .0.join(", "))]
    AmbiguousHelper(Vec<String>),

    /// No rebuild helper is installed or configured
    #[error("no rebuild helper detected; set 'helper' in the configuration (supported: {0})")]
    NoHelper(String),

    /// The configured helper binary is not on PATH
    #[error("rebuild helper '{0}' not found in PATH")]
    HelperNotFound(String),

    /// The rebuild helper exited unsuccessfully
    #[error("rebuild helper exited with code {0}")]
    HelperFailed(i32),

    /// An external query tool failed or produced unusable output
    #[error("{tool}: {reason}")]
    ExternalTool { tool: String, reason: String },

    /// Durable store failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Malformed configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an `ExternalTool` error
    pub fn external(tool: &str, reason: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;
