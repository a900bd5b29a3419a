use rusqlite::{Connection, params};

use super::types::{Notification, NotificationKind};

const SELECT_NOTIFICATION: &str = "\
    SELECT id, to_uid, title, message, kind, read, created_at FROM notifications";

fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
    let kind: String = row.get("kind")?;
    Ok(Notification {
        id: row.get("id")?,
        to_uid: row.get("to_uid")?,
        title: row.get("title")?,
        message: row.get("message")?,
        kind: kind.parse::<NotificationKind>().unwrap_or(NotificationKind::Info),
        read: row.get("read")?,
        created_at: row.get("created_at")?,
    })
}

/// Insert a notification for one recipient. An unknown recipient violates
/// the FK; callers map that to a validation error.
pub fn create(
    conn: &Connection,
    to_uid: i64,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO notifications (to_uid, title, message, kind) VALUES (?1, ?2, ?3, ?4)",
        params![to_uid, title, message, kind.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Notification>> {
    let sql = format!("{SELECT_NOTIFICATION} WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], row_to_notification)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// A user's notifications, newest first.
pub fn find_for_user(conn: &Connection, to_uid: i64) -> rusqlite::Result<Vec<Notification>> {
    let sql = format!(
        "{SELECT_NOTIFICATION} WHERE to_uid = ?1 ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let notifications = stmt
        .query_map(params![to_uid], row_to_notification)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notifications)
}

/// Mark a notification read. Marking an already-read one again is a no-op.
pub fn mark_read(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute("UPDATE notifications SET read = 1 WHERE id = ?1", params![id])?;
    Ok(())
}
