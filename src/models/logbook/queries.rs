use rusqlite::{Connection, params};

use super::types::{Logbook, LogbookPatch, LogbookStatus, NewLogbook};
use crate::models::proposal::ApprovalStamp;

const SELECT_LOGBOOK: &str = "\
    SELECT id, proposal_id, student_id, student_name, supervisor_id, supervisor_name, \
           project_title, week_no, meeting_no, term, date_range, \
           work_done, discussion, problems, further_notes, \
           status, locked, supervisor_feedback, \
           approved_by, approved_uid, approved_at, \
           created_at, updated_at \
    FROM logbooks";

fn list_to_json(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn list_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn row_to_logbook(row: &rusqlite::Row) -> rusqlite::Result<Logbook> {
    let status: String = row.get("status")?;
    let work_done: String = row.get("work_done")?;
    let discussion: String = row.get("discussion")?;
    let problems: String = row.get("problems")?;
    let digital_approval = match (
        row.get::<_, Option<String>>("approved_by")?,
        row.get::<_, Option<i64>>("approved_uid")?,
        row.get::<_, Option<String>>("approved_at")?,
    ) {
        (Some(approved_by), Some(uid), Some(timestamp)) => Some(ApprovalStamp {
            approved_by,
            uid,
            timestamp,
        }),
        _ => None,
    };
    Ok(Logbook {
        id: row.get("id")?,
        proposal_id: row.get("proposal_id")?,
        student_id: row.get("student_id")?,
        student_name: row.get("student_name")?,
        supervisor_id: row.get("supervisor_id")?,
        supervisor_name: row.get("supervisor_name")?,
        project_title: row.get("project_title")?,
        week_no: row.get("week_no")?,
        meeting_no: row.get("meeting_no")?,
        term: row.get("term")?,
        date_range: row.get("date_range")?,
        work_done: list_from_json(&work_done),
        discussion: list_from_json(&discussion),
        problems: list_from_json(&problems),
        further_notes: row.get("further_notes")?,
        status: status.parse::<LogbookStatus>().unwrap_or(LogbookStatus::Pending),
        locked: row.get("locked")?,
        supervisor_feedback: row.get("supervisor_feedback")?,
        digital_approval,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Insert a logbook. A second entry for the same student and week violates
/// the UNIQUE index; callers map that to a conflict.
pub fn create(conn: &Connection, new: &NewLogbook) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO logbooks (proposal_id, student_id, student_name, supervisor_id, \
                               supervisor_name, project_title, week_no, meeting_no, \
                               term, date_range, work_done, discussion, problems, \
                               further_notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            new.proposal_id,
            new.student_id,
            new.student_name,
            new.supervisor_id,
            new.supervisor_name,
            new.project_title,
            new.week_no,
            new.meeting_no,
            new.term,
            new.date_range,
            list_to_json(&new.work_done),
            list_to_json(&new.discussion),
            list_to_json(&new.problems),
            new.further_notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Logbook>> {
    let sql = format!("{SELECT_LOGBOOK} WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], row_to_logbook)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// List filters. `party` is the visibility overlay for non-coordinators.
#[derive(Debug, Default)]
pub struct LogbookFilter {
    pub student_id: Option<i64>,
    pub supervisor_id: Option<i64>,
    pub proposal_id: Option<i64>,
    pub party: Option<i64>,
}

pub fn find_filtered(conn: &Connection, filter: &LogbookFilter) -> rusqlite::Result<Vec<Logbook>> {
    let mut sql = format!("{SELECT_LOGBOOK} WHERE 1=1");
    let mut args: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(uid) = filter.student_id {
        args.push(rusqlite::types::Value::Integer(uid));
        sql.push_str(&format!(" AND student_id = ?{}", args.len()));
    }
    if let Some(sid) = filter.supervisor_id {
        args.push(rusqlite::types::Value::Integer(sid));
        sql.push_str(&format!(" AND supervisor_id = ?{}", args.len()));
    }
    if let Some(pid) = filter.proposal_id {
        args.push(rusqlite::types::Value::Integer(pid));
        sql.push_str(&format!(" AND proposal_id = ?{}", args.len()));
    }
    if let Some(uid) = filter.party {
        args.push(rusqlite::types::Value::Integer(uid));
        let n = args.len();
        sql.push_str(&format!(" AND (student_id = ?{n} OR supervisor_id = ?{n})"));
    }
    sql.push_str(" ORDER BY week_no ASC, id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let logbooks = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), row_to_logbook)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(logbooks)
}

/// Compare-and-set the status; false means a competing transition won.
pub fn set_status_if(
    conn: &Connection,
    id: i64,
    from: LogbookStatus,
    to: LogbookStatus,
) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE logbooks SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
         WHERE id = ?2 AND status = ?3",
        params![to.as_str(), id, from.as_str()],
    )?;
    Ok(updated == 1)
}

pub fn set_status(conn: &Connection, id: i64, to: LogbookStatus) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE logbooks SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
         WHERE id = ?2",
        params![to.as_str(), id],
    )?;
    Ok(())
}

/// Record the supervisor's digital approval and lock the entry against
/// further student edits.
pub fn stamp_approval(
    conn: &Connection,
    id: i64,
    approved_by: &str,
    approved_uid: i64,
    timestamp: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE logbooks SET locked = 1, approved_by = ?2, approved_uid = ?3, \
                approved_at = ?4, updated_at = ?4 \
         WHERE id = ?1",
        params![id, approved_by, approved_uid, timestamp],
    )?;
    Ok(())
}

pub fn stamp_rejection(
    conn: &Connection,
    id: i64,
    timestamp: &str,
    feedback: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE logbooks SET supervisor_feedback = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, feedback, timestamp],
    )?;
    Ok(())
}

/// Apply content patches. Status and feedback entries are skipped here; the
/// workflow layer owns those.
pub fn apply_content_patch(
    conn: &Connection,
    id: i64,
    patches: &[LogbookPatch],
) -> rusqlite::Result<()> {
    for patch in patches {
        match patch {
            LogbookPatch::WeekNo(v) => set_column(conn, id, "week_no", v)?,
            LogbookPatch::MeetingNo(v) => set_column(conn, id, "meeting_no", v)?,
            LogbookPatch::Term(v) => set_column(conn, id, "term", v)?,
            LogbookPatch::DateRange(v) => set_column(conn, id, "date_range", v)?,
            LogbookPatch::WorkDone(v) => set_column(conn, id, "work_done", &list_to_json(v))?,
            LogbookPatch::Discussion(v) => set_column(conn, id, "discussion", &list_to_json(v))?,
            LogbookPatch::Problems(v) => set_column(conn, id, "problems", &list_to_json(v))?,
            LogbookPatch::FurtherNotes(v) => set_column(conn, id, "further_notes", v)?,
            LogbookPatch::Status(_) | LogbookPatch::SupervisorFeedback(_) => {}
        }
    }
    Ok(())
}

fn set_column(
    conn: &Connection,
    id: i64,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "UPDATE logbooks SET {column} = ?2, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') WHERE id = ?1"
        ),
        params![id, value],
    )?;
    Ok(())
}
