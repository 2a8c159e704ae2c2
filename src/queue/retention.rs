// src/queue/retention.rs

//! Retention pruning for the trigger event history
//!
//! Events older than the retention window are deleted after each mutating
//! queue operation. Queue rows are never touched here, so a package marked
//! long ago stays queued even after its history has expired.

use crate::db::models::TriggerEvent;
use crate::error::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::debug;

/// Format a timestamp the way the store records it
///
/// Millisecond precision with a `Z` suffix keeps lexicographic and
/// chronological order identical.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Oldest timestamp that survives pruning
///
/// `None` when retention is disabled, or when the window reaches back past
/// the earliest representable date (nothing can be old enough).
pub fn cutoff(retention_days: u32, now: DateTime<Utc>) -> Option<String> {
    if retention_days == 0 {
        return None;
    }
    let window = Duration::try_days(i64::from(retention_days))?;
    now.checked_sub_signed(window).map(timestamp)
}

/// Delete events older than the retention window
///
/// Returns the number of events removed.
pub fn prune(conn: &Connection, retention_days: u32, now: DateTime<Utc>) -> Result<usize> {
    let Some(cutoff) = cutoff(retention_days, now) else {
        return Ok(0);
    };

    let removed = TriggerEvent::delete_older_than(conn, &cutoff)?;
    if removed > 0 {
        debug!("Pruned {} trigger events older than {}", removed, cutoff);
    }
    Ok(removed)
}
