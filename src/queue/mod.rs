// src/queue/mod.rs

//! Durable rebuild queue
//!
//! The queue is a current-state projection (`queue` table) kept alongside an
//! append-only history of mark actions (`trigger_events`). Both are updated in
//! the same IMMEDIATE transaction, and the retention pruner runs after every
//! mutating operation commits.

pub mod retention;

use crate::db::{self, models::QueueEntry, models::TriggerEvent};
use crate::error::{Error, Result};
use crate::name::PackageName;
use crate::trigger::MarkIntent;
use chrono::Utc;
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// A queued package together with its mark history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedPackage {
    pub package: String,
    pub first_marked_at: String,
    /// Events for this package, oldest first
    pub events: Vec<TriggerEvent>,
}

impl QueuedPackage {
    /// Most recent event, if any history remains
    pub fn latest(&self) -> Option<&TriggerEvent> {
        self.events.last()
    }

    /// Cause of the most recent mark
    ///
    /// A package whose history has been pruned reads as an external mark.
    pub fn latest_cause(&self) -> &str {
        self.latest().map(TriggerEvent::cause).unwrap_or("external")
    }
}

/// Result of an unmark operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmarkOutcome {
    /// Packages that were removed from the queue
    pub removed: Vec<String>,
    /// Requested packages that were not queued
    pub missing: Vec<String>,
}

/// What a clear operation removes (or removed)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearPreview {
    /// Trigger the clear is scoped to; `None` clears everything
    pub trigger: Option<String>,
    /// Packages leaving the queue
    pub dequeued: Vec<String>,
    /// Number of history events deleted
    pub events_removed: usize,
}

impl ClearPreview {
    pub fn is_empty(&self) -> bool {
        self.dequeued.is_empty() && self.events_removed == 0
    }
}

/// The rebuild queue store
pub struct RebuildQueue {
    conn: Connection,
    retention_days: u32,
}

impl RebuildQueue {
    /// Wrap an open connection
    pub fn new(conn: Connection, retention_days: u32) -> Self {
        Self { conn, retention_days }
    }

    /// Open the queue for writing, creating the database on first use
    pub fn open(db_path: impl AsRef<Path>, retention_days: u32) -> Result<Self> {
        Ok(Self::new(db::open(db_path)?, retention_days))
    }

    /// Open the queue for reading; a missing database reads as empty
    pub fn open_readonly(db_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(db::open_readonly(db_path)?, 0))
    }

    /// Access the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Mark a single package
    ///
    /// Returns `true` if the package was newly queued. An event is recorded
    /// either way.
    pub fn mark(
        &mut self,
        package: &PackageName,
        trigger: Option<&PackageName>,
        version: Option<&str>,
    ) -> Result<bool> {
        let newly = self.mark_many(std::slice::from_ref(package), trigger, version)?;
        Ok(newly == 1)
    }

    /// Mark several packages with the same cause in one transaction
    ///
    /// Returns the number of newly queued packages.
    pub fn mark_many(
        &mut self,
        packages: &[PackageName],
        trigger: Option<&PackageName>,
        version: Option<&str>,
    ) -> Result<usize> {
        let now = retention::timestamp(Utc::now());
        let newly = db::transaction(&mut self.conn, |tx| {
            let mut newly = 0;
            for package in packages {
                if record_mark(
                    tx,
                    package.as_str(),
                    trigger.map(PackageName::as_str),
                    version,
                    &now,
                )? {
                    newly += 1;
                }
            }
            Ok(newly)
        })?;

        info!("Marked {} package(s), {} newly queued", packages.len(), newly);
        self.prune_expired();
        Ok(newly)
    }

    /// Apply trigger engine intents in one transaction
    ///
    /// Returns the number of newly queued packages.
    pub fn mark_batch(&mut self, intents: &[MarkIntent]) -> Result<usize> {
        if intents.is_empty() {
            return Ok(0);
        }

        let now = retention::timestamp(Utc::now());
        let newly = db::transaction(&mut self.conn, |tx| {
            let mut newly = 0;
            for intent in intents {
                if record_mark(
                    tx,
                    intent.package.as_str(),
                    Some(intent.trigger.as_str()),
                    intent.version.as_deref(),
                    &now,
                )? {
                    newly += 1;
                }
            }
            Ok(newly)
        })?;

        info!("Applied {} mark intent(s), {} newly queued", intents.len(), newly);
        self.prune_expired();
        Ok(newly)
    }

    /// Remove packages from the queue
    ///
    /// Removals are committed before misses are reported. In strict mode any
    /// miss turns into `Error::NotFound` after the commit.
    pub fn unmark(&mut self, packages: &[PackageName], strict: bool) -> Result<UnmarkOutcome> {
        let outcome = db::transaction(&mut self.conn, |tx| {
            let mut outcome = UnmarkOutcome::default();
            let mut seen = HashSet::new();
            for package in packages {
                if !seen.insert(package.as_str()) {
                    continue;
                }
                if QueueEntry::delete(tx, package.as_str())? {
                    outcome.removed.push(package.to_string());
                } else {
                    outcome.missing.push(package.to_string());
                }
            }
            Ok(outcome)
        })?;

        if !outcome.removed.is_empty() {
            info!("Unmarked: {}", outcome.removed.join(", "));
            self.prune_expired();
        }

        if strict && !outcome.missing.is_empty() {
            return Err(Error::NotFound(outcome.missing));
        }
        Ok(outcome)
    }

    /// Unmark exactly the packages a successful rebuild covered
    pub fn rebuild_confirm(&mut self, packages: &[PackageName]) -> Result<usize> {
        let outcome = self.unmark(packages, false)?;
        Ok(outcome.removed.len())
    }

    /// All queued packages with their history, oldest mark first
    pub fn list(&self) -> Result<Vec<QueuedPackage>> {
        let entries = QueueEntry::list_all(&self.conn)?;
        let mut queued = Vec::with_capacity(entries.len());
        for entry in entries {
            let events = TriggerEvent::list_for_package(&self.conn, &entry.package)?;
            queued.push(QueuedPackage {
                package: entry.package,
                first_marked_at: entry.first_marked_at,
                events,
            });
        }
        Ok(queued)
    }

    /// Names of all queued packages, oldest mark first
    pub fn package_names(&self) -> Result<Vec<String>> {
        Ok(QueueEntry::list_all(&self.conn)?
            .into_iter()
            .map(|entry| entry.package)
            .collect())
    }

    /// The queued subset of `packages`, in input order, each at most once
    pub fn query(&self, packages: &[PackageName]) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut queued = Vec::new();
        for package in packages {
            if seen.insert(package.as_str()) && QueueEntry::exists(&self.conn, package.as_str())? {
                queued.push(package.to_string());
            }
        }
        Ok(queued)
    }

    /// Check whether a package is queued
    pub fn is_marked(&self, package: &PackageName) -> Result<bool> {
        QueueEntry::exists(&self.conn, package.as_str())
    }

    /// Most recent event for a package
    pub fn latest_event(&self, package: &PackageName) -> Result<Option<TriggerEvent>> {
        TriggerEvent::latest_for_package(&self.conn, package.as_str())
    }

    /// Full event history for a package, oldest first
    pub fn events(&self, package: &PackageName) -> Result<Vec<TriggerEvent>> {
        TriggerEvent::list_for_package(&self.conn, package.as_str())
    }

    /// Compute what a clear would remove without writing anything
    pub fn clear_preview(&self, trigger: Option<&PackageName>) -> Result<ClearPreview> {
        preview(&self.conn, trigger)
    }

    /// Clear the queue, or only what a trigger contributed
    ///
    /// A full clear removes every queue row and event. A trigger-scoped clear
    /// deletes that trigger's events and dequeues the affected packages that
    /// have no events left; packages also marked by other triggers or by hand
    /// stay queued.
    pub fn clear_commit(&mut self, trigger: Option<&PackageName>) -> Result<ClearPreview> {
        let cleared = db::transaction(&mut self.conn, |tx| {
            let planned = preview(tx, trigger)?;
            match trigger {
                None => {
                    QueueEntry::delete_all(tx)?;
                    TriggerEvent::delete_all(tx)?;
                }
                Some(trigger) => {
                    let affected = TriggerEvent::packages_for_trigger(tx, trigger.as_str())?;
                    TriggerEvent::delete_for_trigger(tx, trigger.as_str())?;
                    for package in &affected {
                        QueueEntry::delete_if_no_events(tx, package)?;
                    }
                }
            }
            Ok(planned)
        })?;

        info!(
            "Cleared {} package(s) and {} event(s)",
            cleared.dequeued.len(),
            cleared.events_removed
        );
        self.prune_expired();
        Ok(cleared)
    }

    /// Run the retention pruner, logging instead of failing
    fn prune_expired(&self) {
        if let Err(e) = retention::prune(&self.conn, self.retention_days, Utc::now()) {
            warn!("Failed to prune trigger event history: {}", e);
        }
    }
}

/// Record one mark: insert the queue row if absent and append an event
fn record_mark(
    tx: &Transaction,
    package: &str,
    trigger: Option<&str>,
    version: Option<&str>,
    now: &str,
) -> Result<bool> {
    let newly = QueueEntry::insert_if_absent(tx, package, now)?;
    let mut event = TriggerEvent::new(
        package.to_string(),
        trigger.map(str::to_string),
        version.map(str::to_string),
        now.to_string(),
    );
    event.insert(tx)?;

    debug!(
        "Marked {} ({}){}",
        package,
        event.cause(),
        if newly { "" } else { ", already queued" }
    );
    Ok(newly)
}

fn preview(conn: &Connection, trigger: Option<&PackageName>) -> Result<ClearPreview> {
    match trigger {
        None => Ok(ClearPreview {
            trigger: None,
            dequeued: QueueEntry::list_all(conn)?
                .into_iter()
                .map(|entry| entry.package)
                .collect(),
            events_removed: TriggerEvent::count_all(conn)? as usize,
        }),
        Some(trigger) => {
            let mut dequeued = Vec::new();
            for package in TriggerEvent::packages_for_trigger(conn, trigger.as_str())? {
                if QueueEntry::exists(conn, &package)?
                    && TriggerEvent::count_excluding_trigger(conn, &package, trigger.as_str())? == 0
                {
                    dequeued.push(package);
                }
            }
            Ok(ClearPreview {
                trigger: Some(trigger.to_string()),
                dequeued,
                events_removed: TriggerEvent::count_for_trigger(conn, trigger.as_str())? as usize,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use tempfile::tempdir;

    fn name(s: &str) -> PackageName {
        PackageName::parse(s).unwrap()
    }

    fn names(list: &[&str]) -> Vec<PackageName> {
        list.iter().map(|s| name(s)).collect()
    }

    fn memory_queue() -> RebuildQueue {
        RebuildQueue::new(db::open_in_memory().unwrap(), 90)
    }

    fn intent(package: &str, trigger: &str, version: &str) -> MarkIntent {
        MarkIntent {
            package: name(package),
            trigger: name(trigger),
            version: Some(version.to_string()),
        }
    }

    #[test]
    fn test_mark_and_remark() {
        let mut queue = memory_queue();

        assert!(queue.mark(&name("foo"), None, None).unwrap());
        assert!(!queue.mark(&name("foo"), Some(&name("qt6-base")), Some("6.8.0")).unwrap());

        let list = queue.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].events.len(), 2);
        assert_eq!(list[0].latest_cause(), "qt6-base");
        assert_eq!(list[0].events[0].cause(), "external");
    }

    #[test]
    fn test_list_empty_queue() {
        let queue = memory_queue();
        assert!(queue.list().unwrap().is_empty());
    }

    #[test]
    fn test_mark_batch_single_transaction() {
        let mut queue = memory_queue();
        let intents = vec![
            intent("foo", "qt6-base", "6.8.0"),
            intent("bar", "qt6-base", "6.8.0"),
            intent("foo", "boost", "1.87.0"),
        ];

        assert_eq!(queue.mark_batch(&intents).unwrap(), 2);
        assert_eq!(
            queue.query(&names(&["foo", "bar", "baz"])).unwrap(),
            vec!["foo", "bar"]
        );
        assert_eq!(queue.events(&name("foo")).unwrap().len(), 2);
    }

    #[test]
    fn test_unmark_keeps_history() {
        let mut queue = memory_queue();
        queue.mark(&name("foo"), None, None).unwrap();

        let outcome = queue.unmark(&names(&["foo"]), false).unwrap();
        assert_eq!(outcome.removed, vec!["foo"]);
        assert!(!queue.is_marked(&name("foo")).unwrap());
        assert_eq!(queue.events(&name("foo")).unwrap().len(), 1);
    }

    #[test]
    fn test_unmark_missing_non_strict() {
        let mut queue = memory_queue();
        let outcome = queue.unmark(&names(&["missing"]), false).unwrap();
        assert!(outcome.removed.is_empty());
        assert_eq!(outcome.missing, vec!["missing"]);
    }

    #[test]
    fn test_strict_unmark_commits_then_reports() {
        let mut queue = memory_queue();
        queue.mark_many(&names(&["a", "b"]), None, None).unwrap();

        let err = queue.unmark(&names(&["a", "c"]), true).unwrap_err();
        match err {
            Error::NotFound(missing) => assert_eq!(missing, vec!["c"]),
            other => panic!("unexpected error: {other}"),
        }

        // The removal of "a" was committed regardless
        assert!(!queue.is_marked(&name("a")).unwrap());
        assert!(queue.is_marked(&name("b")).unwrap());
    }

    #[test]
    fn test_query_deduplicates() {
        let mut queue = memory_queue();
        queue.mark(&name("foo"), None, None).unwrap();

        assert_eq!(queue.query(&names(&["foo", "foo"])).unwrap(), vec!["foo"]);
    }

    #[test]
    fn test_trigger_scoped_clear() {
        let mut queue = memory_queue();
        queue
            .mark_batch(&[
                intent("only-t1", "t1", "2.0"),
                intent("both", "t1", "2.0"),
                intent("both", "t2", "5.0"),
            ])
            .unwrap();
        queue.mark(&name("manual"), None, None).unwrap();
        queue.mark(&name("manual"), Some(&name("t1")), Some("2.0")).unwrap();

        let preview = queue.clear_preview(Some(&name("t1"))).unwrap();
        assert_eq!(preview.dequeued, vec!["only-t1"]);
        assert_eq!(preview.events_removed, 3);

        let cleared = queue.clear_commit(Some(&name("t1"))).unwrap();
        assert_eq!(cleared, preview);

        assert!(!queue.is_marked(&name("only-t1")).unwrap());
        assert!(queue.is_marked(&name("both")).unwrap());
        assert!(queue.is_marked(&name("manual")).unwrap());
        assert_eq!(queue.events(&name("both")).unwrap().len(), 1);
    }

    #[test]
    fn test_full_clear() {
        let mut queue = memory_queue();
        queue.mark_batch(&[intent("foo", "t1", "1.0")]).unwrap();
        queue.mark(&name("bar"), None, None).unwrap();

        let preview = queue.clear_preview(None).unwrap();
        assert_eq!(preview.dequeued.len(), 2);
        assert_eq!(preview.events_removed, 2);
        assert!(queue.is_marked(&name("foo")).unwrap());

        queue.clear_commit(None).unwrap();
        assert!(queue.list().unwrap().is_empty());
        assert_eq!(TriggerEvent::count_all(queue.connection()).unwrap(), 0);
    }

    #[test]
    fn test_clear_unknown_trigger_is_empty() {
        let mut queue = memory_queue();
        queue.mark(&name("foo"), None, None).unwrap();

        let cleared = queue.clear_commit(Some(&name("nothing"))).unwrap();
        assert!(cleared.is_empty());
        assert!(queue.is_marked(&name("foo")).unwrap());
    }

    #[test]
    fn test_rebuild_confirm_unmarks_exactly_those() {
        let mut queue = memory_queue();
        queue.mark_many(&names(&["a", "b", "c"]), None, None).unwrap();

        assert_eq!(queue.rebuild_confirm(&names(&["a", "c"])).unwrap(), 2);
        assert_eq!(queue.package_names().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_mark_prunes_expired_history() {
        let mut queue = memory_queue();
        let mut old = TriggerEvent::new(
            "old".to_string(),
            None,
            None,
            "2000-01-01T00:00:00.000Z".to_string(),
        );
        old.insert(queue.connection()).unwrap();

        queue.mark(&name("foo"), None, None).unwrap();
        assert!(queue.events(&name("old")).unwrap().is_empty());
    }

    #[test]
    fn test_mark_with_huge_retention_window() {
        let mut queue = RebuildQueue::new(db::open_in_memory().unwrap(), u32::MAX);

        assert!(queue.mark(&name("foo"), None, None).unwrap());
        assert_eq!(queue.events(&name("foo")).unwrap().len(), 1);
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rekindle.db");

        {
            let mut queue = RebuildQueue::open(&db_path, 90).unwrap();
            queue.mark(&name("foo"), None, None).unwrap();
        }

        let queue = RebuildQueue::open_readonly(&db_path).unwrap();
        assert!(queue.is_marked(&name("foo")).unwrap());
        assert_eq!(queue.latest_event(&name("foo")).unwrap().unwrap().cause(), "external");
    }

    #[test]
    fn test_concurrent_writers_serialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rekindle.db");
        let barrier = Arc::new(Barrier::new(4));

        // The database does not exist yet: every writer races the first open
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let db_path = db_path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let mut queue = RebuildQueue::open(&db_path, 90).unwrap();
                    for j in 0..10 {
                        let pkg = PackageName::parse(&format!("pkg-{i}-{j}")).unwrap();
                        queue.mark(&pkg, None, None).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let queue = RebuildQueue::open_readonly(&db_path).unwrap();
        assert_eq!(queue.list().unwrap().len(), 40);
    }
}
