//! Shared test infrastructure for model and workflow layer tests.
//!
//! This module provides common utilities for setting up test databases
//! and seeding accounts in each of the three roles.
//!
//! # Test Database Setup
//! - `setup_test_db()` - Schema + default settings row
//! - `setup_test_pool()` - Same on an r2d2 pool, for handler-level tests

#![allow(dead_code)]

use rusqlite::Connection;
use tempfile::TempDir;

use wilmon::auth::identity::AuthUser;
use wilmon::auth::password;
use wilmon::db::{self, DbPool, MIGRATIONS};
use wilmon::models::user::{self, NewUser, Role};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const TEST_PASSWORD: &str = "Password1!";

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// Setup a test database with schema applied.
///
/// Creates a temporary SQLite database and runs migrations, which also
/// seed the singleton settings row. This is the standard setup for all
/// model-layer and workflow-layer tests.
///
/// Returns a tuple of (TempDir, Connection) where TempDir must be kept
/// alive for the Connection to remain valid.
pub fn setup_test_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let conn = rusqlite::Connection::open(&db_path).expect("Failed to open test DB");

    conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL;")
        .expect("Failed to set pragmas");

    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");

    (dir, conn)
}

/// Setup a pooled test database for tests that drive the HTTP surface.
///
/// Returns a tuple of (TempDir, DbPool) where TempDir must be kept alive
/// for the pool's connections to remain valid.
pub fn setup_test_pool() -> (TempDir, DbPool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let path_str = db_path.to_str().expect("Temp path is not valid UTF-8");

    let pool = db::init_pool(path_str);
    db::run_migrations(&pool);

    (dir, pool)
}

// ============================================================================
// ACCOUNT SEEDING
// ============================================================================

/// Create a user row and return the identity the request extractor would
/// produce for it.
pub fn seed_user(
    conn: &Connection,
    role: Role,
    full_name: &str,
    email: &str,
    research_areas: &[&str],
    max_capacity: i64,
) -> AuthUser {
    let new = NewUser {
        role,
        full_name: full_name.to_string(),
        email: email.to_string(),
        password: password::hash_password(TEST_PASSWORD).expect("Failed to hash password"),
        id_number: None,
        employee_number: None,
        program: None,
        research_areas: research_areas.iter().map(|a| a.to_string()).collect(),
        max_capacity,
    };
    let id = user::create(conn, &new).expect("Failed to create user");
    AuthUser {
        id,
        email: email.to_string(),
        role,
        full_name: full_name.to_string(),
    }
}

pub fn seed_student(conn: &Connection) -> AuthUser {
    seed_user(conn, Role::Student, "Alice Student", "alice@uni.edu", &[], 5)
}

pub fn seed_supervisor(conn: &Connection) -> AuthUser {
    seed_user(
        conn,
        Role::Supervisor,
        "Dr Sam Mentor",
        "sam@uni.edu",
        &["web", "iot"],
        5,
    )
}

pub fn seed_coordinator(conn: &Connection) -> AuthUser {
    seed_user(
        conn,
        Role::Coordinator,
        "Prof Carol Chair",
        "carol@uni.edu",
        &[],
        5,
    )
}
