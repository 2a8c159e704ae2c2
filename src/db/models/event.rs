// src/db/models/event.rs

//! Trigger events: the append-only history of mark actions
//!
//! An event with no trigger package records an external (manual) mark.

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

const SELECT_COLUMNS: &str = "SELECT id, package, trigger_package, trigger_version, marked_at FROM trigger_events";

/// One mark action against a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub id: Option<i64>,
    pub package: String,
    /// Trigger package that caused the mark; `None` for external marks
    pub trigger_package: Option<String>,
    /// Version of the trigger package at the time of the mark
    pub trigger_version: Option<String>,
    pub marked_at: String,
}

impl TriggerEvent {
    /// Create a new, unsaved event
    pub fn new(
        package: String,
        trigger_package: Option<String>,
        trigger_version: Option<String>,
        marked_at: String,
    ) -> Self {
        Self {
            id: None,
            package,
            trigger_package,
            trigger_version,
            marked_at,
        }
    }

    /// Display label for the cause of this mark
    pub fn cause(&self) -> &str {
        self.trigger_package.as_deref().unwrap_or("external")
    }

    /// Append this event to the history
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO trigger_events (package, trigger_package, trigger_version, marked_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &self.package,
                &self.trigger_package,
                &self.trigger_version,
                &self.marked_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Events for a package, oldest first
    pub fn list_for_package(conn: &Connection, package: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE package = ?1 ORDER BY marked_at, id",
            SELECT_COLUMNS
        ))?;

        let events = stmt
            .query_map([package], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// Most recent event for a package
    pub fn latest_for_package(conn: &Connection, package: &str) -> Result<Option<Self>> {
        let event = conn
            .query_row(
                &format!("{} WHERE package = ?1 ORDER BY marked_at DESC, id DESC LIMIT 1", SELECT_COLUMNS),
                [package],
                Self::from_row,
            )
            .optional()?;
        Ok(event)
    }

    /// Distinct packages that have events from a trigger, sorted
    pub fn packages_for_trigger(conn: &Connection, trigger: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT package FROM trigger_events WHERE trigger_package = ?1 ORDER BY package",
        )?;

        let packages = stmt
            .query_map([trigger], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(packages)
    }

    /// Count events for a package that did not come from `trigger`
    pub fn count_excluding_trigger(conn: &Connection, package: &str, trigger: &str) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM trigger_events
             WHERE package = ?1 AND (trigger_package IS NULL OR trigger_package != ?2)",
            params![package, trigger],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count events recorded for a trigger
    pub fn count_for_trigger(conn: &Connection, trigger: &str) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM trigger_events WHERE trigger_package = ?1",
            [trigger],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count all events
    pub fn count_all(conn: &Connection) -> Result<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM trigger_events", [], |row| row.get(0))?)
    }

    /// Delete all events from a trigger
    pub fn delete_for_trigger(conn: &Connection, trigger: &str) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM trigger_events WHERE trigger_package = ?1",
            [trigger],
        )?)
    }

    /// Delete the whole history
    pub fn delete_all(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM trigger_events", [])?)
    }

    /// Delete events marked before `cutoff` (RFC 3339)
    pub fn delete_older_than(conn: &Connection, cutoff: &str) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM trigger_events WHERE marked_at < ?1",
            [cutoff],
        )?)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package: row.get(1)?,
            trigger_package: row.get(2)?,
            trigger_version: row.get(3)?,
            marked_at: row.get(4)?,
        })
    }
}
