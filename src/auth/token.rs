//! Opaque bearer tokens backed by the `sessions` table.
//!
//! A token is 32 random bytes, hex-encoded, with a fixed 7-day expiry bound
//! server-side. There is no refresh and no revocation: a token stays valid
//! until it expires, even across later role or password changes.

use chrono::{Duration, Utc};
use rand::Rng;
use rusqlite::{Connection, params};

use crate::auth::identity::AuthUser;
use crate::errors::AppError;
use crate::models::user::Role;

pub const TOKEN_TTL_DAYS: i64 = 7;

const BAD_TOKEN: &str = "Invalid or expired token";

/// Mint a session token for a user and persist it with its expiry.
pub fn issue(conn: &Connection, user_id: i64) -> Result<String, AppError> {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    let token = hex::encode(bytes);

    let expires_at = (Utc::now() + Duration::days(TOKEN_TTL_DAYS))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, expires_at],
    )?;
    Ok(token)
}

/// Look a bearer token up and return the caller it identifies.
///
/// Unknown and expired tokens produce the same error so a probing client
/// cannot tell the two apart.
pub fn verify(conn: &Connection, bearer: &str) -> Result<AuthUser, AppError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.email, u.role, u.full_name, s.expires_at
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.token = ?1",
    )?;
    let mut rows = stmt.query(params![bearer])?;

    let row = match rows.next()? {
        Some(row) => row,
        None => return Err(AppError::Unauthorized(BAD_TOKEN.to_string())),
    };

    let expires_at: String = row.get("expires_at")?;
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    if expires_at <= now {
        return Err(AppError::Unauthorized(BAD_TOKEN.to_string()));
    }

    let role: String = row.get("role")?;
    let role: Role = role
        .parse()
        .map_err(|_| AppError::Unauthorized(BAD_TOKEN.to_string()))?;

    Ok(AuthUser {
        id: row.get("id")?,
        email: row.get("email")?,
        role,
        full_name: row.get("full_name")?,
    })
}

/// Drop session rows whose expiry has passed. Returns the number removed.
pub fn prune_expired(conn: &Connection) -> rusqlite::Result<usize> {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])
}
