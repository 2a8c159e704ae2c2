// src/db/mod.rs

//! Database layer for the rebuild queue
//!
//! The database is SQLite in WAL mode. Several short-lived processes (pacman
//! hooks, manual runs) may open it at once: writers serialize on
//! `BEGIN IMMEDIATE` and wait up to the busy timeout, readers see the last
//! committed snapshot.

pub mod models;
pub mod paths;
pub mod schema;

use crate::error::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits for another process to release the lock
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize a new database at the given path, creating parent directories
pub fn init(db_path: impl AsRef<Path>) -> Result<()> {
    let db_path = db_path.as_ref();
    info!("Initializing database at: {}", db_path.display());

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;

    debug!("Database initialized");
    Ok(())
}

/// Open the database for writing, creating it on first use
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if !db_path.exists() {
        init(db_path)?;
    }

    debug!("Opening database: {}", db_path.display());
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

/// Open the database for reading
///
/// A missing database reads as an empty queue, so read-only commands never
/// create files. The returned connection is then an empty in-memory store.
pub fn open_readonly(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if !db_path.exists() {
        debug!("No database at {}, using an empty store", db_path.display());
        return open_in_memory();
    }

    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

/// Open a fresh in-memory database with the current schema
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    schema::migrate(&conn)?;
    Ok(conn)
}

/// Run `f` inside an IMMEDIATE transaction
///
/// The transaction commits only if `f` succeeds; any error rolls it back.
pub fn transaction<F, T>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let result = f(&tx)?;
    tx.commit()?;
    Ok(result)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/state/rekindle.db");

        init(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_sets_wal_mode() {
        let dir = tempdir().unwrap();
        let conn = open(dir.path().join("rekindle.db")).unwrap();

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_open_readonly_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("missing.db");

        let conn = open_readonly(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM queue", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert!(!db_path.exists());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let dir = tempdir().unwrap();
        let mut conn = open(dir.path().join("rekindle.db")).unwrap();

        let result: Result<()> = transaction(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO queue (package, first_marked_at) VALUES ('foo', 'now')",
                [],
            )?;
            Err(crate::error::Error::Config("boom".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM queue", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
