//! Proposal lifecycle: submission and the review transitions. Every
//! transition re-checks the actor against the stored record before mutating,
//! and the status flip, provenance stamps, checklist updates, and
//! notification writes all commit in one transaction.

use chrono::Utc;
use rusqlite::Connection;

use crate::auth::identity::AuthUser;
use crate::errors::AppError;
use crate::matching;
use crate::models::notification::{self, NotificationKind};
use crate::models::proposal::{self, NewProposal, Proposal, ProposalPatch, ProposalStatus};
use crate::models::settings;
use crate::models::user::{self, Role, User};

/// Fields a student supplies when submitting. The supervisor choice is
/// optional; absent, the best-ranked candidate is assigned.
pub struct ProposalSubmission {
    pub title: String,
    pub description: String,
    pub research_area: String,
    pub group_members: String,
    pub supervisor_id: Option<i64>,
}

/// Reachable targets from a given status. `rejected` and `activated` are
/// terminal, and nothing transitions into `flagged`.
pub fn allowed_targets(from: ProposalStatus) -> &'static [ProposalStatus] {
    match from {
        ProposalStatus::Pending => &[ProposalStatus::Approved, ProposalStatus::Rejected],
        ProposalStatus::Approved => &[ProposalStatus::Activated, ProposalStatus::Rejected],
        _ => &[],
    }
}

/// Create a proposal for the calling student.
///
/// The similarity score is recomputed server-side regardless of anything the
/// client sent, and a score at or above the configured threshold blocks the
/// submission outright.
pub fn submit_proposal(
    conn: &mut Connection,
    actor: &AuthUser,
    submission: &ProposalSubmission,
) -> Result<Proposal, AppError> {
    if actor.role != Role::Student {
        return Err(AppError::PermissionDenied(
            "Only students may submit proposals".to_string(),
        ));
    }

    let tx = conn.transaction()?;
    let config = settings::get(&tx)?;

    let existing_titles = proposal::all_titles(&tx)?;
    let check = matching::duplicate_check(
        &submission.title,
        &existing_titles,
        config.similarity_threshold,
    );
    if check.is_duplicate {
        return Err(AppError::Conflict(format!(
            "A very similar project already exists ({}% match). Please revise the title.",
            check.percentage
        )));
    }

    let supervisors = user::find_supervisors(&tx)?;
    let (supervisor_id, supervisor_name) =
        resolve_supervisor(&supervisors, submission.supervisor_id, &submission.research_area)?;

    let new = NewProposal {
        title: submission.title.clone(),
        description: submission.description.clone(),
        research_area: submission.research_area.clone(),
        group_members: submission.group_members.clone(),
        submitted_by: actor.id,
        submitted_by_name: actor.full_name.clone(),
        supervisor_id,
        supervisor_name: supervisor_name.clone(),
        similarity_score: check.percentage,
    };
    let proposal_id = proposal::create(&tx, &new)?;

    notification::create(
        &tx,
        supervisor_id,
        "New proposal submitted",
        &format!(
            "{} submitted \"{}\" for your review",
            actor.full_name, submission.title
        ),
        NotificationKind::Info,
    )?;

    let created = proposal::find_by_id(&tx, proposal_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;
    Ok(created)
}

fn resolve_supervisor(
    supervisors: &[User],
    requested: Option<i64>,
    research_area: &str,
) -> Result<(i64, String), AppError> {
    if let Some(id) = requested {
        let chosen = supervisors
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::Validation("Selected supervisor does not exist".to_string()))?;
        if chosen.current_groups >= chosen.max_capacity {
            return Err(AppError::Conflict(format!(
                "Supervisor {} has no remaining capacity",
                chosen.full_name
            )));
        }
        return Ok((chosen.id, chosen.full_name.clone()));
    }

    let ranked = matching::rank_supervisors(research_area, supervisors);
    ranked
        .into_iter()
        .next()
        .map(|m| (m.supervisor.id, m.supervisor.full_name))
        .ok_or_else(|| {
            AppError::Conflict("No supervisor with spare capacity is available".to_string())
        })
}

/// Move a proposal along the status graph on behalf of an actor.
pub fn transition_proposal(
    conn: &mut Connection,
    actor: &AuthUser,
    proposal_id: i64,
    target: ProposalStatus,
    feedback: Option<&str>,
) -> Result<Proposal, AppError> {
    let tx = conn.transaction()?;
    let current = proposal::find_by_id(&tx, proposal_id)?.ok_or(AppError::NotFound)?;

    if !allowed_targets(current.status).contains(&target) {
        return Err(AppError::Validation(format!(
            "Cannot move a {} proposal to {target}",
            current.status
        )));
    }

    // `allowed_targets` is the one copy of the graph; this match only picks
    // the reviewer for edges it let through.
    match (current.status, target) {
        (ProposalStatus::Pending, ProposalStatus::Approved) => {
            approve_by_supervisor(&tx, actor, &current, feedback)?
        }
        (ProposalStatus::Pending, ProposalStatus::Rejected) => {
            reject_by_supervisor(&tx, actor, &current, feedback)?
        }
        (ProposalStatus::Approved, ProposalStatus::Activated) => {
            activate_by_coordinator(&tx, actor, &current)?
        }
        (ProposalStatus::Approved, ProposalStatus::Rejected) => {
            reject_by_coordinator(&tx, actor, &current, feedback)?
        }
        (from, to) => {
            return Err(AppError::Internal(format!(
                "Transition {from} to {to} has no reviewer"
            )));
        }
    }

    let updated = proposal::find_by_id(&tx, proposal_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;
    Ok(updated)
}

/// Apply content edits for the submitting student. Only pending proposals
/// are editable; review outcomes freeze the record.
pub fn edit_proposal(
    conn: &mut Connection,
    actor: &AuthUser,
    proposal_id: i64,
    patches: &[ProposalPatch],
) -> Result<Proposal, AppError> {
    if let Some(stray) = patches.iter().find(|p| !p.is_content()) {
        return Err(AppError::Validation(format!(
            "Field '{}' can only change as part of a status transition",
            stray.field_name()
        )));
    }

    let tx = conn.transaction()?;
    let current = proposal::find_by_id(&tx, proposal_id)?.ok_or(AppError::NotFound)?;

    if current.submitted_by != actor.id {
        return Err(AppError::PermissionDenied(
            "Only the submitting student may edit this proposal".to_string(),
        ));
    }
    if current.status != ProposalStatus::Pending {
        return Err(AppError::Conflict(format!(
            "A {} proposal can no longer be edited",
            current.status
        )));
    }

    proposal::apply_content_patch(&tx, proposal_id, patches)?;

    let updated = proposal::find_by_id(&tx, proposal_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;
    Ok(updated)
}

fn require_assigned_supervisor(
    actor: &AuthUser,
    current: &Proposal,
    verb: &str,
) -> Result<(), AppError> {
    if actor.role != Role::Supervisor || current.supervisor_id != Some(actor.id) {
        return Err(AppError::PermissionDenied(format!(
            "Only the assigned supervisor may {verb} this proposal"
        )));
    }
    Ok(())
}

fn require_coordinator(actor: &AuthUser, verb: &str) -> Result<(), AppError> {
    if actor.role != Role::Coordinator {
        return Err(AppError::PermissionDenied(format!(
            "Only a coordinator may {verb} proposals"
        )));
    }
    Ok(())
}

fn require_feedback(feedback: Option<&str>) -> Result<&str, AppError> {
    match feedback.map(str::trim) {
        Some(f) if !f.is_empty() => Ok(f),
        _ => Err(AppError::Validation(
            "Feedback is required when rejecting".to_string(),
        )),
    }
}

fn approve_by_supervisor(
    conn: &Connection,
    actor: &AuthUser,
    current: &Proposal,
    feedback: Option<&str>,
) -> Result<(), AppError> {
    require_assigned_supervisor(actor, current, "approve")?;

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    if !proposal::set_status_if(conn, current.id, ProposalStatus::Pending, ProposalStatus::Approved)? {
        return Err(AppError::Conflict(
            "Proposal status changed while reviewing".to_string(),
        ));
    }
    proposal::stamp_supervisor_approval(conn, current.id, &actor.full_name, actor.id, &now, feedback)?;
    proposal::mark_step_done(conn, current.id, proposal::STEP_SUPERVISOR_REVIEW, &now)?;

    notification::create(
        conn,
        current.submitted_by,
        "Proposal approved by supervisor",
        &format!(
            "{} approved \"{}\" and forwarded it to the coordinator",
            actor.full_name, current.title
        ),
        NotificationKind::Success,
    )?;
    notification::create(
        conn,
        actor.id,
        "Approval recorded",
        &format!("You approved \"{}\"", current.title),
        NotificationKind::Info,
    )?;
    Ok(())
}

fn reject_by_supervisor(
    conn: &Connection,
    actor: &AuthUser,
    current: &Proposal,
    feedback: Option<&str>,
) -> Result<(), AppError> {
    require_assigned_supervisor(actor, current, "reject")?;
    let feedback = require_feedback(feedback)?;

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    if !proposal::set_status_if(conn, current.id, ProposalStatus::Pending, ProposalStatus::Rejected)? {
        return Err(AppError::Conflict(
            "Proposal status changed while reviewing".to_string(),
        ));
    }
    proposal::stamp_supervisor_rejection(conn, current.id, &actor.full_name, &now, feedback)?;

    notification::create(
        conn,
        current.submitted_by,
        "Proposal rejected",
        &format!("{} rejected \"{}\": {}", actor.full_name, current.title, feedback),
        NotificationKind::Danger,
    )?;
    Ok(())
}

fn activate_by_coordinator(
    conn: &Connection,
    actor: &AuthUser,
    current: &Proposal,
) -> Result<(), AppError> {
    require_coordinator(actor, "activate")?;
    let supervisor_id = current
        .supervisor_id
        .ok_or_else(|| AppError::Validation("Proposal has no supervisor assigned".to_string()))?;

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    if !proposal::set_status_if(conn, current.id, ProposalStatus::Approved, ProposalStatus::Activated)? {
        return Err(AppError::Conflict(
            "Proposal status changed while reviewing".to_string(),
        ));
    }
    if !user::try_increment_groups(conn, supervisor_id)? {
        return Err(AppError::Conflict(format!(
            "Supervisor {} has no remaining capacity",
            current.supervisor_name
        )));
    }
    proposal::stamp_coordinator_activation(conn, current.id, &actor.full_name, &now)?;
    proposal::mark_step_done(conn, current.id, proposal::STEP_COORDINATOR_REVIEW, &now)?;
    proposal::mark_step_done(conn, current.id, proposal::STEP_PROJECT_ACTIVATED, &now)?;

    notification::create(
        conn,
        current.submitted_by,
        "Project activated",
        &format!(
            "\"{}\" is now active. Weekly logbooks are open.",
            current.title
        ),
        NotificationKind::Success,
    )?;
    notification::create(
        conn,
        supervisor_id,
        "Project activated",
        &format!(
            "\"{}\" by {} was activated and added to your supervision load",
            current.title, current.submitted_by_name
        ),
        NotificationKind::Success,
    )?;
    Ok(())
}

fn reject_by_coordinator(
    conn: &Connection,
    actor: &AuthUser,
    current: &Proposal,
    feedback: Option<&str>,
) -> Result<(), AppError> {
    require_coordinator(actor, "reject")?;
    let feedback = require_feedback(feedback)?;

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    if !proposal::set_status_if(conn, current.id, ProposalStatus::Approved, ProposalStatus::Rejected)? {
        return Err(AppError::Conflict(
            "Proposal status changed while reviewing".to_string(),
        ));
    }
    proposal::stamp_coordinator_rejection(conn, current.id, &actor.full_name, &now, feedback)?;

    notification::create(
        conn,
        current.submitted_by,
        "Proposal rejected by coordinator",
        &format!("{} rejected \"{}\": {}", actor.full_name, current.title, feedback),
        NotificationKind::Danger,
    )?;
    if let Some(supervisor_id) = current.supervisor_id {
        notification::create(
            conn,
            supervisor_id,
            "Proposal rejected by coordinator",
            &format!(
                "{} rejected \"{}\" by {}: {}",
                actor.full_name, current.title, current.submitted_by_name, feedback
            ),
            NotificationKind::Danger,
        )?;
    }
    Ok(())
}
