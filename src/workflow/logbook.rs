//! Logbook lifecycle: weekly submission, supervisor review, and the
//! resubmission path after a rejection. Approval locks the entry; a locked
//! entry never becomes editable again.

use chrono::Utc;
use rusqlite::Connection;

use crate::auth::identity::AuthUser;
use crate::db;
use crate::errors::AppError;
use crate::models::logbook::{self, Logbook, LogbookPatch, LogbookStatus, NewLogbook};
use crate::models::notification::{self, NotificationKind};
use crate::models::proposal;
use crate::models::user::Role;

pub struct LogbookSubmission {
    pub proposal_id: Option<i64>,
    pub week_no: i64,
    pub meeting_no: i64,
    pub term: String,
    pub date_range: String,
    pub work_done: Vec<String>,
    pub discussion: Vec<String>,
    pub problems: Vec<String>,
    pub further_notes: String,
}

/// Create a weekly logbook entry for the calling student.
///
/// The entry binds to the student's activated project; project title and
/// supervisor are denormalised from it, never taken from the wire. One entry
/// per week per student, enforced by the store.
pub fn submit_logbook(
    conn: &mut Connection,
    actor: &AuthUser,
    submission: &LogbookSubmission,
) -> Result<Logbook, AppError> {
    if actor.role != Role::Student {
        return Err(AppError::PermissionDenied(
            "Only students may submit logbooks".to_string(),
        ));
    }
    if submission.week_no < 1 {
        return Err(AppError::Validation(
            "Week number must be at least 1".to_string(),
        ));
    }

    let tx = conn.transaction()?;
    let project = proposal::find_activated_for_student(&tx, actor.id)?.ok_or_else(|| {
        AppError::Validation("You need an activated project before submitting logbooks".to_string())
    })?;
    if let Some(pid) = submission.proposal_id {
        if pid != project.id {
            return Err(AppError::Validation(
                "Logbook must reference your activated project".to_string(),
            ));
        }
    }

    let new = NewLogbook {
        proposal_id: project.id,
        student_id: actor.id,
        student_name: actor.full_name.clone(),
        supervisor_id: project.supervisor_id,
        supervisor_name: project.supervisor_name.clone(),
        project_title: project.title.clone(),
        week_no: submission.week_no,
        meeting_no: submission.meeting_no,
        term: submission.term.clone(),
        date_range: submission.date_range.clone(),
        work_done: submission.work_done.clone(),
        discussion: submission.discussion.clone(),
        problems: submission.problems.clone(),
        further_notes: submission.further_notes.clone(),
    };
    let logbook_id = match logbook::create(&tx, &new) {
        Ok(id) => id,
        Err(e) if db::is_constraint_violation(&e) => {
            return Err(AppError::Conflict(format!(
                "A logbook for week {} already exists",
                submission.week_no
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(supervisor_id) = project.supervisor_id {
        notification::create(
            &tx,
            supervisor_id,
            "New logbook submitted",
            &format!(
                "{} submitted a week {} logbook for \"{}\"",
                actor.full_name, submission.week_no, project.title
            ),
            NotificationKind::Info,
        )?;
    }

    let created = logbook::find_by_id(&tx, logbook_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;
    Ok(created)
}

/// Move a logbook between review states on behalf of an actor.
pub fn transition_logbook(
    conn: &mut Connection,
    actor: &AuthUser,
    logbook_id: i64,
    target: LogbookStatus,
    feedback: Option<&str>,
) -> Result<Logbook, AppError> {
    let tx = conn.transaction()?;
    let current = logbook::find_by_id(&tx, logbook_id)?.ok_or(AppError::NotFound)?;

    match (current.status, target) {
        (LogbookStatus::Pending, LogbookStatus::Approved) => {
            approve_by_supervisor(&tx, actor, &current)?
        }
        (LogbookStatus::Pending, LogbookStatus::Rejected) => {
            reject_by_supervisor(&tx, actor, &current, feedback)?
        }
        (from, to) => {
            return Err(AppError::Validation(format!(
                "Cannot move a {from} logbook to {to}"
            )));
        }
    }

    let updated = logbook::find_by_id(&tx, logbook_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;
    Ok(updated)
}

/// Apply content edits for the owning student. Editing a rejected entry
/// resubmits it: the status returns to pending for another review pass.
pub fn edit_logbook(
    conn: &mut Connection,
    actor: &AuthUser,
    logbook_id: i64,
    patches: &[LogbookPatch],
) -> Result<Logbook, AppError> {
    if let Some(stray) = patches.iter().find(|p| !p.is_content()) {
        return Err(AppError::Validation(format!(
            "Field '{}' can only change as part of a status transition",
            stray.field_name()
        )));
    }
    for patch in patches {
        if let LogbookPatch::WeekNo(week_no) = patch {
            if *week_no < 1 {
                return Err(AppError::Validation(
                    "Week number must be at least 1".to_string(),
                ));
            }
        }
    }

    let tx = conn.transaction()?;
    let current = logbook::find_by_id(&tx, logbook_id)?.ok_or(AppError::NotFound)?;

    if current.student_id != actor.id {
        return Err(AppError::PermissionDenied(
            "Only the owning student may edit this logbook".to_string(),
        ));
    }
    if current.locked {
        return Err(AppError::Conflict(
            "An approved logbook is locked and cannot be edited".to_string(),
        ));
    }

    if let Err(e) = logbook::apply_content_patch(&tx, logbook_id, patches) {
        if db::is_constraint_violation(&e) {
            return Err(AppError::Conflict(
                "A logbook for that week already exists".to_string(),
            ));
        }
        return Err(e.into());
    }
    if current.status == LogbookStatus::Rejected {
        logbook::set_status(&tx, logbook_id, LogbookStatus::Pending)?;
        if let Some(supervisor_id) = current.supervisor_id {
            notification::create(
                &tx,
                supervisor_id,
                "Logbook resubmitted",
                &format!(
                    "{} revised the week {} logbook for \"{}\"",
                    actor.full_name, current.week_no, current.project_title
                ),
                NotificationKind::Info,
            )?;
        }
    }

    let updated = logbook::find_by_id(&tx, logbook_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;
    Ok(updated)
}

fn require_assigned_supervisor(
    actor: &AuthUser,
    current: &Logbook,
    verb: &str,
) -> Result<(), AppError> {
    if actor.role != Role::Supervisor || current.supervisor_id != Some(actor.id) {
        return Err(AppError::PermissionDenied(format!(
            "Only the assigned supervisor may {verb} this logbook"
        )));
    }
    Ok(())
}

fn approve_by_supervisor(
    conn: &Connection,
    actor: &AuthUser,
    current: &Logbook,
) -> Result<(), AppError> {
    require_assigned_supervisor(actor, current, "approve")?;

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    if !logbook::set_status_if(conn, current.id, LogbookStatus::Pending, LogbookStatus::Approved)? {
        return Err(AppError::Conflict(
            "Logbook status changed while reviewing".to_string(),
        ));
    }
    logbook::stamp_approval(conn, current.id, &actor.full_name, actor.id, &now)?;

    notification::create(
        conn,
        current.student_id,
        "Logbook approved",
        &format!(
            "{} approved your week {} logbook",
            actor.full_name, current.week_no
        ),
        NotificationKind::Success,
    )?;
    Ok(())
}

fn reject_by_supervisor(
    conn: &Connection,
    actor: &AuthUser,
    current: &Logbook,
    feedback: Option<&str>,
) -> Result<(), AppError> {
    require_assigned_supervisor(actor, current, "reject")?;
    let feedback = match feedback.map(str::trim) {
        Some(f) if !f.is_empty() => f,
        _ => {
            return Err(AppError::Validation(
                "Feedback is required when rejecting".to_string(),
            ));
        }
    };

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    if !logbook::set_status_if(conn, current.id, LogbookStatus::Pending, LogbookStatus::Rejected)? {
        return Err(AppError::Conflict(
            "Logbook status changed while reviewing".to_string(),
        ));
    }
    logbook::stamp_rejection(conn, current.id, &now, feedback)?;

    notification::create(
        conn,
        current.student_id,
        "Logbook needs revision",
        &format!(
            "{} rejected your week {} logbook: {}",
            actor.full_name, current.week_no, feedback
        ),
        NotificationKind::Danger,
    )?;
    Ok(())
}
