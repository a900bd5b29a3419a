//! Integration tests for the weekly logbook lifecycle: binding to the
//! activated project, the one-entry-per-week rule, supervisor review with
//! locking, and the rejection and resubmission cycle.

mod common;

use rusqlite::Connection;

use common::*;
use wilmon::auth::identity::AuthUser;
use wilmon::errors::AppError;
use wilmon::models::logbook::{self, LogbookFilter, LogbookPatch, LogbookStatus};
use wilmon::models::notification::{self, NotificationKind};
use wilmon::models::proposal::{Proposal, ProposalStatus};
use wilmon::models::user::Role;
use wilmon::workflow::{self, LogbookSubmission, ProposalSubmission};

/// Walk a fresh proposal through approval and activation so logbooks open.
fn activated_project(
    conn: &mut Connection,
    student: &AuthUser,
    supervisor: &AuthUser,
    coordinator: &AuthUser,
    title: &str,
) -> Proposal {
    let prop = workflow::submit_proposal(
        conn,
        student,
        &ProposalSubmission {
            title: title.to_string(),
            description: "Build and evaluate the system over one term".to_string(),
            research_area: "web".to_string(),
            group_members: String::new(),
            supervisor_id: Some(supervisor.id),
        },
    )
    .unwrap();
    workflow::transition_proposal(conn, supervisor, prop.id, ProposalStatus::Approved, None).unwrap();
    workflow::transition_proposal(conn, coordinator, prop.id, ProposalStatus::Activated, None)
        .unwrap()
}

fn week_entry(week_no: i64) -> LogbookSubmission {
    LogbookSubmission {
        proposal_id: None,
        week_no,
        meeting_no: 1,
        term: "Term 1".to_string(),
        date_range: "Mar 3 - Mar 7".to_string(),
        work_done: vec!["Set up the repository".to_string()],
        discussion: vec!["Agreed on milestones".to_string()],
        problems: Vec::new(),
        further_notes: String::new(),
    }
}

#[test]
fn test_logbook_requires_activated_project() {
    let (_dir, mut conn) = setup_test_db();
    let student = seed_student(&conn);

    let result = workflow::submit_logbook(&mut conn, &student, &week_entry(1));
    assert!(matches!(result, Err(AppError::Validation(_))));

    let supervisor = seed_supervisor(&conn);
    let result = workflow::submit_logbook(&mut conn, &supervisor, &week_entry(1));
    assert!(matches!(result, Err(AppError::PermissionDenied(_))));

    println!("[PASS] test_logbook_requires_activated_project");
}

#[test]
fn test_submit_binds_to_activated_project() {
    let (_dir, mut conn) = setup_test_db();
    let student = seed_student(&conn);
    let supervisor = seed_supervisor(&conn);
    let coordinator = seed_coordinator(&conn);
    let project = activated_project(
        &mut conn,
        &student,
        &supervisor,
        &coordinator,
        "Recycling Pickup Scheduler",
    );

    let entry = workflow::submit_logbook(&mut conn, &student, &week_entry(1)).unwrap();

    // Project fields come from the activated proposal, not the wire
    assert_eq!(entry.proposal_id, project.id);
    assert_eq!(entry.project_title, project.title);
    assert_eq!(entry.supervisor_id, Some(supervisor.id));
    assert_eq!(entry.supervisor_name, supervisor.full_name);
    assert_eq!(entry.student_name, student.full_name);
    assert_eq!(entry.status, LogbookStatus::Pending);
    assert!(!entry.locked);
    assert_eq!(entry.work_done, vec!["Set up the repository".to_string()]);
    assert_eq!(entry.problems, Vec::<String>::new());

    let notes = notification::find_for_user(&conn, supervisor.id).unwrap();
    assert_eq!(notes[0].title, "New logbook submitted");
    assert_eq!(notes[0].kind, NotificationKind::Info);

    // A claimed proposal id must still be the student's own project
    let mut mismatched = week_entry(2);
    mismatched.proposal_id = Some(project.id + 100);
    let result = workflow::submit_logbook(&mut conn, &student, &mismatched);
    assert!(matches!(result, Err(AppError::Validation(_))));

    println!("[PASS] test_submit_binds_to_activated_project");
}

#[test]
fn test_one_entry_per_week_per_student() {
    let (_dir, mut conn) = setup_test_db();
    let student = seed_student(&conn);
    let classmate = seed_user(&conn, Role::Student, "Ben Student", "ben@uni.edu", &[], 5);
    let supervisor = seed_supervisor(&conn);
    let coordinator = seed_coordinator(&conn);
    activated_project(
        &mut conn,
        &student,
        &supervisor,
        &coordinator,
        "Recycling Pickup Scheduler",
    );
    activated_project(
        &mut conn,
        &classmate,
        &supervisor,
        &coordinator,
        "Neighborhood Tool Lending Registry",
    );

    workflow::submit_logbook(&mut conn, &student, &week_entry(1)).unwrap();

    let result = workflow::submit_logbook(&mut conn, &student, &week_entry(1));
    match result {
        Err(AppError::Conflict(msg)) => assert!(msg.contains("week 1"), "got: {msg}"),
        other => panic!("Expected conflict, got {other:?}"),
    }

    // Another week, and another student's week 1, are both fine
    workflow::submit_logbook(&mut conn, &student, &week_entry(2)).unwrap();
    workflow::submit_logbook(&mut conn, &classmate, &week_entry(1)).unwrap();

    let result = workflow::submit_logbook(&mut conn, &student, &week_entry(0));
    assert!(matches!(result, Err(AppError::Validation(_))));

    println!("[PASS] test_one_entry_per_week_per_student");
}

#[test]
fn test_supervisor_approval_locks_entry() {
    let (_dir, mut conn) = setup_test_db();
    let student = seed_student(&conn);
    let supervisor = seed_supervisor(&conn);
    let coordinator = seed_coordinator(&conn);
    activated_project(
        &mut conn,
        &student,
        &supervisor,
        &coordinator,
        "Recycling Pickup Scheduler",
    );
    let entry = workflow::submit_logbook(&mut conn, &student, &week_entry(1)).unwrap();

    let approved =
        workflow::transition_logbook(&mut conn, &supervisor, entry.id, LogbookStatus::Approved, None)
            .unwrap();

    assert_eq!(approved.status, LogbookStatus::Approved);
    assert!(approved.locked);
    let stamp = approved.digital_approval.unwrap();
    assert_eq!(stamp.approved_by, supervisor.full_name);
    assert_eq!(stamp.uid, supervisor.id);

    let notes = notification::find_for_user(&conn, student.id).unwrap();
    assert_eq!(notes[0].title, "Logbook approved");
    assert_eq!(notes[0].kind, NotificationKind::Success);

    // Locked entries refuse edits, and approved is terminal
    let result = workflow::edit_logbook(
        &mut conn,
        &student,
        entry.id,
        &[LogbookPatch::FurtherNotes("One more thing".to_string())],
    );
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let result =
        workflow::transition_logbook(&mut conn, &supervisor, entry.id, LogbookStatus::Rejected, Some("Changed my mind"));
    assert!(matches!(result, Err(AppError::Validation(_))));

    println!("[PASS] test_supervisor_approval_locks_entry");
}

#[test]
fn test_rejection_and_resubmission_cycle() {
    let (_dir, mut conn) = setup_test_db();
    let student = seed_student(&conn);
    let supervisor = seed_supervisor(&conn);
    let coordinator = seed_coordinator(&conn);
    activated_project(
        &mut conn,
        &student,
        &supervisor,
        &coordinator,
        "Recycling Pickup Scheduler",
    );
    let entry = workflow::submit_logbook(&mut conn, &student, &week_entry(1)).unwrap();

    // Feedback is mandatory for a rejection
    let result =
        workflow::transition_logbook(&mut conn, &supervisor, entry.id, LogbookStatus::Rejected, None);
    assert!(matches!(result, Err(AppError::Validation(_))));

    let rejected = workflow::transition_logbook(
        &mut conn,
        &supervisor,
        entry.id,
        LogbookStatus::Rejected,
        Some("Week summary is too thin"),
    )
    .unwrap();
    assert_eq!(rejected.status, LogbookStatus::Rejected);
    assert!(!rejected.locked);
    assert_eq!(
        rejected.supervisor_feedback.as_deref(),
        Some("Week summary is too thin")
    );

    let student_notes = notification::find_for_user(&conn, student.id).unwrap();
    assert_eq!(student_notes[0].title, "Logbook needs revision");
    assert_eq!(student_notes[0].kind, NotificationKind::Danger);

    // Editing a rejected entry resubmits it for review
    let revised = workflow::edit_logbook(
        &mut conn,
        &student,
        entry.id,
        &[LogbookPatch::WorkDone(vec![
            "Set up the repository".to_string(),
            "Wrote the data model".to_string(),
        ])],
    )
    .unwrap();
    assert_eq!(revised.status, LogbookStatus::Pending);
    assert_eq!(revised.work_done.len(), 2);

    let supervisor_notes = notification::find_for_user(&conn, supervisor.id).unwrap();
    assert_eq!(supervisor_notes[0].title, "Logbook resubmitted");

    // Second review pass can approve and lock
    let approved =
        workflow::transition_logbook(&mut conn, &supervisor, entry.id, LogbookStatus::Approved, None)
            .unwrap();
    assert!(approved.locked);

    println!("[PASS] test_rejection_and_resubmission_cycle");
}

#[test]
fn test_edit_guards() {
    let (_dir, mut conn) = setup_test_db();
    let student = seed_student(&conn);
    let other = seed_user(&conn, Role::Student, "Ben Student", "ben@uni.edu", &[], 5);
    let supervisor = seed_supervisor(&conn);
    let coordinator = seed_coordinator(&conn);
    activated_project(
        &mut conn,
        &student,
        &supervisor,
        &coordinator,
        "Recycling Pickup Scheduler",
    );
    let week1 = workflow::submit_logbook(&mut conn, &student, &week_entry(1)).unwrap();
    let week2 = workflow::submit_logbook(&mut conn, &student, &week_entry(2)).unwrap();

    // Only the owner edits
    let result = workflow::edit_logbook(
        &mut conn,
        &other,
        week1.id,
        &[LogbookPatch::Term("Term 2".to_string())],
    );
    assert!(matches!(result, Err(AppError::PermissionDenied(_))));

    // Status and feedback never change through the edit path
    let result = workflow::edit_logbook(
        &mut conn,
        &student,
        week1.id,
        &[LogbookPatch::Status(LogbookStatus::Approved)],
    );
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Week numbers stay positive
    let result =
        workflow::edit_logbook(&mut conn, &student, week1.id, &[LogbookPatch::WeekNo(0)]);
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Moving onto an occupied week trips the per-week constraint
    let result =
        workflow::edit_logbook(&mut conn, &student, week2.id, &[LogbookPatch::WeekNo(1)]);
    assert!(matches!(result, Err(AppError::Conflict(_))));
    let unchanged = logbook::find_by_id(&conn, week2.id).unwrap().unwrap();
    assert_eq!(unchanged.week_no, 2);

    println!("[PASS] test_edit_guards");
}

#[test]
fn test_filtered_listing() {
    let (_dir, mut conn) = setup_test_db();
    let student = seed_student(&conn);
    let classmate = seed_user(&conn, Role::Student, "Ben Student", "ben@uni.edu", &[], 5);
    let supervisor = seed_supervisor(&conn);
    let coordinator = seed_coordinator(&conn);
    let project = activated_project(
        &mut conn,
        &student,
        &supervisor,
        &coordinator,
        "Recycling Pickup Scheduler",
    );
    activated_project(
        &mut conn,
        &classmate,
        &supervisor,
        &coordinator,
        "Neighborhood Tool Lending Registry",
    );

    workflow::submit_logbook(&mut conn, &student, &week_entry(2)).unwrap();
    workflow::submit_logbook(&mut conn, &student, &week_entry(1)).unwrap();
    workflow::submit_logbook(&mut conn, &classmate, &week_entry(1)).unwrap();

    // Party overlay: a student sees only their own entries, week order ascending
    let mine = logbook::find_filtered(
        &conn,
        &LogbookFilter {
            party: Some(student.id),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].week_no, 1);
    assert_eq!(mine[1].week_no, 2);

    // The supervisor supervises both students
    let supervised = logbook::find_filtered(
        &conn,
        &LogbookFilter {
            party: Some(supervisor.id),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(supervised.len(), 3);

    let by_project = logbook::find_filtered(
        &conn,
        &LogbookFilter {
            proposal_id: Some(project.id),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(by_project.len(), 2);

    let by_student = logbook::find_filtered(
        &conn,
        &LogbookFilter {
            student_id: Some(classmate.id),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(by_student.len(), 1);

    println!("[PASS] test_filtered_listing");
}
