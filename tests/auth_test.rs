//! Authentication tests covering password hashing, bearer token issue and
//! verification, expiry, and the session sweep.
//!
//! Tests the authentication layer at the model level:
//! - Password hashing with argon2
//! - Token issue (shape, session row) and verification round trip
//! - Rejection of unknown, malformed, and expired tokens
//! - prune_expired removing only dead sessions

mod common;

use regex::Regex;
use rusqlite::params;

use common::*;
use wilmon::auth::{password, token};
use wilmon::db;
use wilmon::errors::AppError;
use wilmon::models::user::{self, NewUser, Role};

#[test]
fn test_hash_and_verify_password() {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");

    assert!(hash.len() > 20);
    assert!(password::verify_password(TEST_PASSWORD, &hash).expect("Verification failed"));
    assert!(!password::verify_password("wrongpassword", &hash).expect("Verification failed"));
}

#[test]
fn test_issue_token_shape() {
    let (_dir, conn) = setup_test_db();
    let student = seed_student(&conn);

    let bearer = token::issue(&conn, student.id).expect("Failed to issue token");

    // 32 random bytes, hex encoded
    let hex64 = Regex::new(r"^[0-9a-f]{64}$").expect("Bad pattern");
    assert!(hex64.is_match(&bearer), "Unexpected token shape: {bearer}");

    let sessions: i64 = conn
        .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
        .expect("Count failed");
    assert_eq!(sessions, 1);
}

#[test]
fn test_verify_token_round_trip() {
    let (_dir, conn) = setup_test_db();
    let supervisor = seed_supervisor(&conn);

    let bearer = token::issue(&conn, supervisor.id).expect("Failed to issue token");
    let identity = token::verify(&conn, &bearer).expect("Failed to verify token");

    assert_eq!(identity.id, supervisor.id);
    assert_eq!(identity.email, supervisor.email);
    assert_eq!(identity.role, Role::Supervisor);
    assert_eq!(identity.full_name, supervisor.full_name);
}

#[test]
fn test_verify_unknown_token_rejected() {
    let (_dir, conn) = setup_test_db();
    seed_student(&conn);

    let result = token::verify(&conn, &"0".repeat(64));
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[test]
fn test_verify_expired_token_rejected() {
    let (_dir, conn) = setup_test_db();
    let student = seed_student(&conn);

    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params!["a".repeat(64), student.id, "2000-01-01T00:00:00"],
    )
    .expect("Failed to insert session");

    let result = token::verify(&conn, &"a".repeat(64));
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[test]
fn test_prune_expired_keeps_live_sessions() {
    let (_dir, conn) = setup_test_db();
    let student = seed_student(&conn);

    let live = token::issue(&conn, student.id).expect("Failed to issue token");
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params!["b".repeat(64), student.id, "2000-01-01T00:00:00"],
    )
    .expect("Failed to insert session");

    let removed = token::prune_expired(&conn).expect("Prune failed");
    assert_eq!(removed, 1);

    assert!(token::verify(&conn, &live).is_ok());
    assert!(token::verify(&conn, &"b".repeat(64)).is_err());
}

#[test]
fn test_find_by_email_is_case_insensitive() {
    let (_dir, conn) = setup_test_db();
    let student = seed_student(&conn);

    let found = user::find_by_email(&conn, "ALICE@UNI.EDU")
        .expect("Query failed")
        .expect("User not found");
    assert_eq!(found.id, student.id);
}

#[test]
fn test_duplicate_email_is_a_constraint_violation() {
    let (_dir, conn) = setup_test_db();
    seed_student(&conn);

    let duplicate = NewUser {
        role: Role::Student,
        full_name: "Second Alice".to_string(),
        email: "Alice@uni.edu".to_string(),
        password: password::hash_password(TEST_PASSWORD).expect("Failed to hash password"),
        id_number: None,
        employee_number: None,
        program: None,
        research_areas: Vec::new(),
        max_capacity: 5,
    };

    let err = user::create(&conn, &duplicate).expect_err("Duplicate email should fail");
    assert!(db::is_constraint_violation(&err));
}
