// src/db/models/queue.rs

//! Queue entries: the current-state projection of marked packages

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

/// A package currently marked for rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub package: String,
    /// RFC 3339 timestamp of the mark that created this entry
    pub first_marked_at: String,
}

impl QueueEntry {
    /// Insert a queue row unless one already exists
    ///
    /// Returns `true` if the package was newly queued.
    pub fn insert_if_absent(conn: &Connection, package: &str, marked_at: &str) -> Result<bool> {
        let rows = conn.execute(
            "INSERT OR IGNORE INTO queue (package, first_marked_at) VALUES (?1, ?2)",
            params![package, marked_at],
        )?;
        Ok(rows > 0)
    }

    /// Find the queue row for a package
    pub fn find(conn: &Connection, package: &str) -> Result<Option<Self>> {
        let entry = conn
            .query_row(
                "SELECT package, first_marked_at FROM queue WHERE package = ?1",
                [package],
                Self::from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Check whether a package is queued
    pub fn exists(conn: &Connection, package: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM queue WHERE package = ?1", [package], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// List all queued packages, oldest mark first
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT package, first_marked_at FROM queue ORDER BY first_marked_at, package",
        )?;

        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Remove a package from the queue; returns `true` if it was queued
    pub fn delete(conn: &Connection, package: &str) -> Result<bool> {
        let rows = conn.execute("DELETE FROM queue WHERE package = ?1", [package])?;
        Ok(rows > 0)
    }

    /// Remove every queue row
    pub fn delete_all(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM queue", [])?)
    }

    /// Remove a queue row only if the package has no remaining trigger events
    pub fn delete_if_no_events(conn: &Connection, package: &str) -> Result<bool> {
        let rows = conn.execute(
            "DELETE FROM queue WHERE package = ?1
             AND NOT EXISTS (SELECT 1 FROM trigger_events WHERE package = ?1)",
            [package],
        )?;
        Ok(rows > 0)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            package: row.get(0)?,
            first_marked_at: row.get(1)?,
        })
    }
}
