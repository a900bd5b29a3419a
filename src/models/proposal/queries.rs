use chrono::Utc;
use rusqlite::{Connection, params};

use super::types::{ApprovalStamp, NewProposal, Proposal, ProposalPatch, ProposalStatus, WorkflowStep};

const SELECT_PROPOSAL: &str = "\
    SELECT id, title, description, research_area, group_members, \
           submitted_by, submitted_by_name, supervisor_id, supervisor_name, \
           similarity_score, status, forwarded_to_coordinator, \
           supervisor_approved_by, supervisor_approved_uid, supervisor_approved_at, \
           supervisor_feedback, coordinator_feedback, \
           coordinator_approved_by, coordinator_approved_at, \
           rejected_by, reviewed_at, created_at, updated_at \
    FROM proposals";

/// The fixed progress checklist seeded for every proposal. Steps 1 and 2
/// complete at submission time: the record exists and a supervisor is
/// attached before the row is committed.
const STEP_SEED: [(&str, &str); 5] = [
    ("Proposal Submitted", "Project proposal received"),
    ("Supervisor Assigned", "A supervisor is attached to the project"),
    ("Supervisor Review", "Awaiting supervisor approval"),
    ("Coordinator Review", "Awaiting coordinator approval"),
    ("Project Activated", "Project is active and logbooks are open"),
];

pub const STEP_SUPERVISOR_REVIEW: i64 = 3;
pub const STEP_COORDINATOR_REVIEW: i64 = 4;
pub const STEP_PROJECT_ACTIVATED: i64 = 5;

fn row_to_proposal(row: &rusqlite::Row) -> rusqlite::Result<Proposal> {
    let status: String = row.get("status")?;
    let supervisor_approval = match (
        row.get::<_, Option<String>>("supervisor_approved_by")?,
        row.get::<_, Option<i64>>("supervisor_approved_uid")?,
        row.get::<_, Option<String>>("supervisor_approved_at")?,
    ) {
        (Some(approved_by), Some(uid), Some(timestamp)) => Some(ApprovalStamp {
            approved_by,
            uid,
            timestamp,
        }),
        _ => None,
    };
    Ok(Proposal {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        research_area: row.get("research_area")?,
        group_members: row.get("group_members")?,
        submitted_by: row.get("submitted_by")?,
        submitted_by_name: row.get("submitted_by_name")?,
        supervisor_id: row.get("supervisor_id")?,
        supervisor_name: row.get("supervisor_name")?,
        similarity_score: row.get("similarity_score")?,
        status: status.parse::<ProposalStatus>().unwrap_or(ProposalStatus::Pending),
        forwarded_to_coordinator: row.get("forwarded_to_coordinator")?,
        supervisor_approval,
        supervisor_feedback: row.get("supervisor_feedback")?,
        coordinator_feedback: row.get("coordinator_feedback")?,
        coordinator_approved_by: row.get("coordinator_approved_by")?,
        coordinator_approved_at: row.get("coordinator_approved_at")?,
        rejected_by: row.get("rejected_by")?,
        reviewed_at: row.get("reviewed_at")?,
        steps: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_steps(conn: &Connection, proposal_id: i64) -> rusqlite::Result<Vec<WorkflowStep>> {
    let mut stmt = conn.prepare(
        "SELECT label, detail, done, done_at FROM proposal_steps \
         WHERE proposal_id = ?1 ORDER BY step_no ASC",
    )?;
    let steps = stmt
        .query_map(params![proposal_id], |row| {
            Ok(WorkflowStep {
                label: row.get("label")?,
                detail: row.get("detail")?,
                done: row.get("done")?,
                timestamp: row.get("done_at")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(steps)
}

/// Insert a proposal and seed its checklist. Callers run this inside a
/// transaction so the row and its steps land together.
pub fn create(conn: &Connection, new: &NewProposal) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO proposals (title, description, research_area, group_members, \
                                submitted_by, submitted_by_name, supervisor_id, \
                                supervisor_name, similarity_score) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            new.title,
            new.description,
            new.research_area,
            new.group_members,
            new.submitted_by,
            new.submitted_by_name,
            new.supervisor_id,
            new.supervisor_name,
            new.similarity_score,
        ],
    )?;
    let proposal_id = conn.last_insert_rowid();

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    for (i, (label, detail)) in STEP_SEED.iter().enumerate() {
        let step_no = (i + 1) as i64;
        let done = step_no <= 2;
        conn.execute(
            "INSERT INTO proposal_steps (proposal_id, step_no, label, detail, done, done_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                proposal_id,
                step_no,
                label,
                detail,
                done,
                if done { Some(now.as_str()) } else { None },
            ],
        )?;
    }
    Ok(proposal_id)
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Proposal>> {
    let sql = format!("{SELECT_PROPOSAL} WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], row_to_proposal)?;
    match rows.next() {
        Some(row) => {
            let mut proposal = row?;
            proposal.steps = load_steps(conn, proposal.id)?;
            Ok(Some(proposal))
        }
        None => Ok(None),
    }
}

/// List filters. `party` is the visibility overlay for non-coordinators:
/// only rows the user submitted or supervises.
#[derive(Debug, Default)]
pub struct ProposalFilter {
    pub submitted_by: Option<i64>,
    pub supervisor_id: Option<i64>,
    pub party: Option<i64>,
}

pub fn find_filtered(conn: &Connection, filter: &ProposalFilter) -> rusqlite::Result<Vec<Proposal>> {
    let mut sql = format!("{SELECT_PROPOSAL} WHERE 1=1");
    let mut args: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(uid) = filter.submitted_by {
        args.push(rusqlite::types::Value::Integer(uid));
        sql.push_str(&format!(" AND submitted_by = ?{}", args.len()));
    }
    if let Some(sid) = filter.supervisor_id {
        args.push(rusqlite::types::Value::Integer(sid));
        sql.push_str(&format!(" AND supervisor_id = ?{}", args.len()));
    }
    if let Some(uid) = filter.party {
        args.push(rusqlite::types::Value::Integer(uid));
        let n = args.len();
        sql.push_str(&format!(" AND (submitted_by = ?{n} OR supervisor_id = ?{n})"));
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let mut proposals = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), row_to_proposal)?
        .collect::<Result<Vec<_>, _>>()?;
    for proposal in &mut proposals {
        proposal.steps = load_steps(conn, proposal.id)?;
    }
    Ok(proposals)
}

/// Titles of every stored proposal, for the duplicate heuristic.
pub fn all_titles(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT title FROM proposals")?;
    let titles = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(titles)
}

/// The most recent activated proposal a student submitted, if any.
pub fn find_activated_for_student(
    conn: &Connection,
    student_id: i64,
) -> rusqlite::Result<Option<Proposal>> {
    let sql = format!(
        "{SELECT_PROPOSAL} WHERE submitted_by = ?1 AND status = 'activated' \
         ORDER BY id DESC LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![student_id], row_to_proposal)?;
    match rows.next() {
        Some(row) => {
            let mut proposal = row?;
            proposal.steps = load_steps(conn, proposal.id)?;
            Ok(Some(proposal))
        }
        None => Ok(None),
    }
}

/// Compare-and-set the status. Returns false when the row's current status
/// no longer matches `from`, meaning a competing transition got there first.
pub fn set_status_if(
    conn: &Connection,
    id: i64,
    from: ProposalStatus,
    to: ProposalStatus,
) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE proposals SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
         WHERE id = ?2 AND status = ?3",
        params![to.as_str(), id, from.as_str()],
    )?;
    Ok(updated == 1)
}

pub fn stamp_supervisor_approval(
    conn: &Connection,
    id: i64,
    approved_by: &str,
    approved_uid: i64,
    timestamp: &str,
    feedback: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE proposals SET forwarded_to_coordinator = 1, \
                supervisor_approved_by = ?2, supervisor_approved_uid = ?3, \
                supervisor_approved_at = ?4, \
                supervisor_feedback = COALESCE(?5, supervisor_feedback), \
                updated_at = ?4 \
         WHERE id = ?1",
        params![id, approved_by, approved_uid, timestamp, feedback],
    )?;
    Ok(())
}

pub fn stamp_supervisor_rejection(
    conn: &Connection,
    id: i64,
    rejected_by: &str,
    timestamp: &str,
    feedback: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE proposals SET supervisor_feedback = ?2, rejected_by = ?3, \
                reviewed_at = ?4, updated_at = ?4 \
         WHERE id = ?1",
        params![id, feedback, rejected_by, timestamp],
    )?;
    Ok(())
}

pub fn stamp_coordinator_activation(
    conn: &Connection,
    id: i64,
    approved_by: &str,
    timestamp: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE proposals SET coordinator_approved_by = ?2, coordinator_approved_at = ?3, \
                updated_at = ?3 \
         WHERE id = ?1",
        params![id, approved_by, timestamp],
    )?;
    Ok(())
}

pub fn stamp_coordinator_rejection(
    conn: &Connection,
    id: i64,
    rejected_by: &str,
    timestamp: &str,
    feedback: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE proposals SET coordinator_feedback = ?2, rejected_by = ?3, \
                reviewed_at = ?4, updated_at = ?4 \
         WHERE id = ?1",
        params![id, feedback, rejected_by, timestamp],
    )?;
    Ok(())
}

/// Mark a checklist step done. A second call for the same step is a no-op,
/// so the original completion timestamp survives.
pub fn mark_step_done(
    conn: &Connection,
    proposal_id: i64,
    step_no: i64,
    timestamp: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE proposal_steps SET done = 1, done_at = ?3 \
         WHERE proposal_id = ?1 AND step_no = ?2 AND done = 0",
        params![proposal_id, step_no, timestamp],
    )?;
    Ok(())
}

/// Apply content patches. Status and feedback entries are skipped here; the
/// workflow layer owns those.
pub fn apply_content_patch(
    conn: &Connection,
    id: i64,
    patches: &[ProposalPatch],
) -> rusqlite::Result<()> {
    for patch in patches {
        let (column, value) = match patch {
            ProposalPatch::Title(v) => ("title", v),
            ProposalPatch::Description(v) => ("description", v),
            ProposalPatch::ResearchArea(v) => ("research_area", v),
            ProposalPatch::GroupMembers(v) => ("group_members", v),
            _ => continue,
        };
        conn.execute(
            &format!(
                "UPDATE proposals SET {column} = ?2, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') WHERE id = ?1"
            ),
            params![id, value],
        )?;
    }
    Ok(())
}
