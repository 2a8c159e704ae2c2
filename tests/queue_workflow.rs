// tests/queue_workflow.rs

//! Rebuild queue lifecycle tests against an on-disk database.

mod common;

use common::{Sandbox, name, names};
use rekindle::db;
use rekindle::db::models::TriggerEvent;
use rekindle::queue::RebuildQueue;
use rekindle::trigger::MarkIntent;
use rekindle::Error;

#[test]
fn test_queue_survives_reopen() {
    let sandbox = Sandbox::new();

    {
        let mut queue = RebuildQueue::open(&sandbox.db_path, 90).unwrap();
        queue
            .mark(&name("foo-git"), Some(&name("qt6-base")), Some("6.7.0-1"))
            .unwrap();
        queue.mark(&name("bar"), None, None).unwrap();
    }

    let queue = RebuildQueue::open_readonly(&sandbox.db_path).unwrap();
    let mut queued = queue.package_names().unwrap();
    queued.sort();
    assert_eq!(queued, vec!["bar", "foo-git"]);

    let latest = queue.latest_event(&name("foo-git")).unwrap().unwrap();
    assert_eq!(latest.trigger_package.as_deref(), Some("qt6-base"));
    assert_eq!(latest.trigger_version.as_deref(), Some("6.7.0-1"));
    assert_eq!(queue.latest_event(&name("bar")).unwrap().unwrap().cause(), "external");
}

#[test]
fn test_history_outlives_unmark() {
    let sandbox = Sandbox::new();
    let mut queue = RebuildQueue::open(&sandbox.db_path, 90).unwrap();

    assert!(queue.mark(&name("foo"), None, None).unwrap());
    assert!(!queue.mark(&name("foo"), None, None).unwrap());
    assert_eq!(queue.events(&name("foo")).unwrap().len(), 2);

    queue.unmark(&names(&["foo"]), false).unwrap();
    assert!(!queue.is_marked(&name("foo")).unwrap());
    assert_eq!(queue.events(&name("foo")).unwrap().len(), 2);
}

#[test]
fn test_strict_unmark_partial_success() {
    let sandbox = Sandbox::new();
    let mut queue = RebuildQueue::open(&sandbox.db_path, 90).unwrap();
    queue.mark(&name("a"), None, None).unwrap();

    let err = queue.unmark(&names(&["a", "ghost"]), true).unwrap_err();
    match err {
        Error::NotFound(missing) => assert_eq!(missing, vec!["ghost"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!queue.is_marked(&name("a")).unwrap());
}

#[test]
fn test_trigger_scoped_clear_sequence() {
    let sandbox = Sandbox::new();
    let mut queue = RebuildQueue::open(&sandbox.db_path, 90).unwrap();

    let intents = vec![
        MarkIntent {
            package: name("app"),
            trigger: name("t1"),
            version: Some("2.0".to_string()),
        },
        MarkIntent {
            package: name("app"),
            trigger: name("t2"),
            version: None,
        },
        MarkIntent {
            package: name("only-t1"),
            trigger: name("t1"),
            version: None,
        },
    ];
    assert_eq!(queue.mark_batch(&intents).unwrap(), 2);

    let preview = queue.clear_preview(Some(&name("t1"))).unwrap();
    assert_eq!(preview.dequeued, vec!["only-t1"]);
    assert_eq!(preview.events_removed, 2);

    // Preview writes nothing
    assert!(queue.is_marked(&name("only-t1")).unwrap());

    let cleared = queue.clear_commit(Some(&name("t1"))).unwrap();
    assert_eq!(cleared, preview);
    assert!(queue.is_marked(&name("app")).unwrap());
    assert!(!queue.is_marked(&name("only-t1")).unwrap());

    queue.clear_commit(Some(&name("t2"))).unwrap();
    assert!(!queue.is_marked(&name("app")).unwrap());

    let conn = queue.connection();
    assert_eq!(TriggerEvent::count_for_trigger(conn, "t1").unwrap(), 0);
    assert_eq!(TriggerEvent::count_all(conn).unwrap(), 0);
}

#[test]
fn test_full_clear_resets_everything() {
    let sandbox = Sandbox::new();
    let mut queue = RebuildQueue::open(&sandbox.db_path, 90).unwrap();
    queue
        .mark_many(&names(&["a", "b"]), Some(&name("icu")), Some("75.1"))
        .unwrap();
    queue.unmark(&names(&["b"]), false).unwrap();

    let cleared = queue.clear_commit(None).unwrap();
    assert_eq!(cleared.dequeued, vec!["a"]);
    assert_eq!(cleared.events_removed, 2);
    assert!(queue.list().unwrap().is_empty());
    assert_eq!(TriggerEvent::count_all(queue.connection()).unwrap(), 0);
}

#[test]
fn test_expired_history_pruned_on_next_write() {
    let sandbox = Sandbox::new();
    let mut queue = RebuildQueue::open(&sandbox.db_path, 30).unwrap();
    queue.mark(&name("old"), None, None).unwrap();

    // Backdate the existing history past the retention window
    queue
        .connection()
        .execute(
            "UPDATE trigger_events SET marked_at = '2001-01-01T00:00:00.000Z'",
            [],
        )
        .unwrap();

    queue.mark(&name("new"), None, None).unwrap();

    assert!(queue.events(&name("old")).unwrap().is_empty());
    assert!(queue.is_marked(&name("old")).unwrap());
    assert_eq!(queue.events(&name("new")).unwrap().len(), 1);
}

#[test]
fn test_zero_retention_keeps_history() {
    let sandbox = Sandbox::new();
    let mut queue = RebuildQueue::open(&sandbox.db_path, 0).unwrap();
    queue.mark(&name("old"), None, None).unwrap();
    queue
        .connection()
        .execute(
            "UPDATE trigger_events SET marked_at = '2001-01-01T00:00:00.000Z'",
            [],
        )
        .unwrap();

    queue.mark(&name("new"), None, None).unwrap();
    assert_eq!(queue.events(&name("old")).unwrap().len(), 1);
}

#[test]
fn test_database_uses_wal() {
    let sandbox = Sandbox::new();
    db::init(&sandbox.db_path).unwrap();
    let conn = db::open(&sandbox.db_path).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn test_readonly_missing_database_is_empty() {
    let sandbox = Sandbox::new();
    let queue = RebuildQueue::open_readonly(&sandbox.db_path).unwrap();

    assert!(queue.list().unwrap().is_empty());
    assert!(!queue.is_marked(&name("foo")).unwrap());
    assert!(!sandbox.db_path.exists());
}
