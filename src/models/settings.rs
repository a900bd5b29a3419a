use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

/// The singleton configuration row. `auto_assignment` and
/// `email_notifications` are stored and served but nothing consumes them
/// yet; supervisor resolution and notification writes run unconditionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub max_supervision_limit: i64,
    pub similarity_threshold: i64,
    pub logbook_deadline: String,
    pub auto_assignment: bool,
    pub email_notifications: bool,
}

/// Read the singleton row. The migration seeds it, so it is always present.
pub fn get(conn: &Connection) -> rusqlite::Result<Settings> {
    conn.query_row(
        "SELECT max_supervision_limit, similarity_threshold, logbook_deadline, \
                auto_assignment, email_notifications \
         FROM settings WHERE id = 1",
        [],
        |row| {
            Ok(Settings {
                max_supervision_limit: row.get("max_supervision_limit")?,
                similarity_threshold: row.get("similarity_threshold")?,
                logbook_deadline: row.get("logbook_deadline")?,
                auto_assignment: row.get("auto_assignment")?,
                email_notifications: row.get("email_notifications")?,
            })
        },
    )
}

/// Replace the singleton row's values.
pub fn update(conn: &Connection, settings: &Settings) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE settings SET max_supervision_limit = ?1, similarity_threshold = ?2, \
                logbook_deadline = ?3, auto_assignment = ?4, email_notifications = ?5, \
                updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
         WHERE id = 1",
        params![
            settings.max_supervision_limit,
            settings.similarity_threshold,
            settings.logbook_deadline,
            settings.auto_assignment,
            settings.email_notifications,
        ],
    )?;
    Ok(())
}
