// src/db/schema.rs

//! Database schema definitions and migrations for the rebuild queue
//!
//! The queue is a small event-sourced store:
//! - `queue`: current-state projection, one row per marked package
//! - `trigger_events`: append-only history of mark actions

use crate::error::{Error, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Read the schema version without writing; `None` before the first migration
fn peek_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(None);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(Some(version))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
///
/// Several processes may open a fresh database at once. The version is
/// re-read under an IMMEDIATE lock, so exactly one of them migrates and the
/// others see the finished schema.
pub fn migrate(conn: &Connection) -> Result<()> {
    if let Some(version) = peek_schema_version(conn)?
        && version >= SCHEMA_VERSION
    {
        debug!("Schema is up to date (version {})", version);
        return Ok(());
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let current_version = get_schema_version(&tx)?;

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(&tx, version)?;
        set_schema_version(&tx, version)?;
    }

    tx.commit()?;
    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::Config(format!("unknown schema migration {}", version))),
    }
}

/// Initial schema - Version 1
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        -- Packages currently marked for rebuild
        CREATE TABLE IF NOT EXISTS queue (
            package TEXT PRIMARY KEY,
            first_marked_at TEXT NOT NULL
        );

        -- Every mark action; outlives the queue row for auditing
        CREATE TABLE IF NOT EXISTS trigger_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package TEXT NOT NULL,
            trigger_package TEXT,
            trigger_version TEXT,
            marked_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_trigger_events_package ON trigger_events(package);
        CREATE INDEX IF NOT EXISTS idx_trigger_events_trigger ON trigger_events(trigger_package);
        CREATE INDEX IF NOT EXISTS idx_trigger_events_marked_at ON trigger_events(marked_at);
        ",
    )?;

    Ok(())
}
