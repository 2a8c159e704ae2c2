// src/db/models/mod.rs

//! Data models for the rebuild queue tables
//!
//! Each struct maps to one table and provides the row-level queries the
//! queue store composes into transactions.

mod event;
mod queue;

pub use event::TriggerEvent;
pub use queue::QueueEntry;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use rusqlite::Connection;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();
        conn
    }

    fn event(package: &str, trigger: Option<&str>, at: &str) -> TriggerEvent {
        TriggerEvent::new(
            package.to_string(),
            trigger.map(str::to_string),
            None,
            at.to_string(),
        )
    }

    #[test]
    fn test_queue_insert_if_absent() {
        let conn = create_test_db();

        assert!(QueueEntry::insert_if_absent(&conn, "foo", "2026-01-01T00:00:00.000Z").unwrap());
        assert!(!QueueEntry::insert_if_absent(&conn, "foo", "2026-02-01T00:00:00.000Z").unwrap());

        let entry = QueueEntry::find(&conn, "foo").unwrap().unwrap();
        assert_eq!(entry.first_marked_at, "2026-01-01T00:00:00.000Z");
        assert!(QueueEntry::exists(&conn, "foo").unwrap());
        assert!(!QueueEntry::exists(&conn, "bar").unwrap());
    }

    #[test]
    fn test_event_ordering() {
        let conn = create_test_db();

        event("foo", Some("b"), "2026-01-02T00:00:00.000Z").insert(&conn).unwrap();
        event("foo", Some("a"), "2026-01-01T00:00:00.000Z").insert(&conn).unwrap();

        let events = TriggerEvent::list_for_package(&conn, "foo").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].cause(), "a");
        assert_eq!(events[1].cause(), "b");

        let latest = TriggerEvent::latest_for_package(&conn, "foo").unwrap().unwrap();
        assert_eq!(latest.cause(), "b");
    }

    #[test]
    fn test_external_event_cause() {
        let e = event("foo", None, "2026-01-01T00:00:00.000Z");
        assert_eq!(e.cause(), "external");
    }

    #[test]
    fn test_delete_if_no_events() {
        let conn = create_test_db();
        QueueEntry::insert_if_absent(&conn, "foo", "2026-01-01T00:00:00.000Z").unwrap();
        event("foo", Some("t1"), "2026-01-01T00:00:00.000Z").insert(&conn).unwrap();

        assert!(!QueueEntry::delete_if_no_events(&conn, "foo").unwrap());
        TriggerEvent::delete_for_trigger(&conn, "t1").unwrap();
        assert!(QueueEntry::delete_if_no_events(&conn, "foo").unwrap());
    }

    #[test]
    fn test_count_excluding_trigger_counts_external_marks() {
        let conn = create_test_db();
        event("foo", Some("t1"), "2026-01-01T00:00:00.000Z").insert(&conn).unwrap();
        event("foo", None, "2026-01-01T00:00:01.000Z").insert(&conn).unwrap();
        event("foo", Some("t2"), "2026-01-01T00:00:02.000Z").insert(&conn).unwrap();

        assert_eq!(TriggerEvent::count_excluding_trigger(&conn, "foo", "t1").unwrap(), 2);
        assert_eq!(TriggerEvent::packages_for_trigger(&conn, "t2").unwrap(), vec!["foo"]);
    }

    #[test]
    fn test_delete_older_than() {
        let conn = create_test_db();
        event("foo", None, "2025-01-01T00:00:00.000Z").insert(&conn).unwrap();
        event("foo", None, "2026-06-01T00:00:00.000Z").insert(&conn).unwrap();

        let removed = TriggerEvent::delete_older_than(&conn, "2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(removed, 1);
        assert_eq!(TriggerEvent::count_all(&conn).unwrap(), 1);
    }
}
