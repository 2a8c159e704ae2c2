// src/lib.rs

//! Rekindle
//!
//! Tracks locally built (AUR) packages that need a rebuild after one of
//! their libraries changed ABI.
//!
//! # Architecture
//!
//! - Database-first: the queue and its mark history live in SQLite (WAL)
//! - Triggers: a registry of ABI-breaking packages with per-trigger thresholds
//! - Overrides: drop-in files that redirect or suppress what a trigger marks
//! - Rebuilds: handed to an external AUR helper; the queue is only updated
//!   after the helper succeeds

pub mod config;
pub mod db;
mod error;
pub mod name;
pub mod overrides;
pub mod packages;
pub mod queue;
pub mod rebuild;
pub mod trigger;
pub mod version;

pub use error::{Error, Result};
pub use name::PackageName;
pub use queue::RebuildQueue;
pub use trigger::{TriggerEngine, Upgrade};
