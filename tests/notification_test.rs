//! Notification model tests: per-recipient listing order, the idempotent
//! read flag, and the recipient FK.

mod common;

use common::*;
use wilmon::db;
use wilmon::models::notification::{self, NotificationKind};

#[test]
fn test_find_for_user_returns_newest_first() {
    let (_dir, conn) = setup_test_db();
    let student = seed_student(&conn);
    let supervisor = seed_supervisor(&conn);

    notification::create(&conn, student.id, "First", "Oldest entry", NotificationKind::Info)
        .expect("Failed to create notification");
    notification::create(&conn, student.id, "Second", "Middle entry", NotificationKind::Success)
        .expect("Failed to create notification");
    notification::create(&conn, supervisor.id, "Other inbox", "Not for the student", NotificationKind::Info)
        .expect("Failed to create notification");
    notification::create(&conn, student.id, "Third", "Newest entry", NotificationKind::Danger)
        .expect("Failed to create notification");

    let notes = notification::find_for_user(&conn, student.id).expect("Query failed");

    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0].title, "Third");
    assert_eq!(notes[1].title, "Second");
    assert_eq!(notes[2].title, "First");
    assert!(notes.iter().all(|n| n.to_uid == student.id));
    assert!(notes.iter().all(|n| !n.read));
}

#[test]
fn test_mark_read_is_idempotent() {
    let (_dir, conn) = setup_test_db();
    let student = seed_student(&conn);

    let id = notification::create(&conn, student.id, "Ping", "Hello", NotificationKind::Info)
        .expect("Failed to create notification");

    notification::mark_read(&conn, id).expect("Mark failed");
    notification::mark_read(&conn, id).expect("Second mark failed");

    let note = notification::find_by_id(&conn, id)
        .expect("Query failed")
        .expect("Notification not found");
    assert!(note.read);
}

#[test]
fn test_unknown_recipient_is_a_constraint_violation() {
    let (_dir, conn) = setup_test_db();

    let err = notification::create(&conn, 9999, "Ghost", "Nobody home", NotificationKind::Info)
        .expect_err("Unknown recipient should fail");
    assert!(db::is_constraint_violation(&err));
}
