use rusqlite::{Connection, params};

use super::types::{NewUser, Role, User, areas_from_csv, areas_to_csv};

const SELECT_USER: &str = "\
    SELECT id, role, full_name, email, password, id_number, employee_number, \
           program, research_areas, current_groups, max_capacity, \
           created_at, updated_at \
    FROM users";

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    let areas: String = row.get("research_areas")?;
    Ok(User {
        id: row.get("id")?,
        role: role.parse::<Role>().unwrap_or(Role::Student),
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        password: row.get("password")?,
        id_number: row.get("id_number")?,
        employee_number: row.get("employee_number")?,
        program: row.get("program")?,
        research_areas: areas_from_csv(&areas),
        current_groups: row.get("current_groups")?,
        max_capacity: row.get("max_capacity")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Insert a new user. A duplicate email surfaces as a constraint violation
/// from the UNIQUE index; callers map that to a conflict.
pub fn create(conn: &Connection, new: &NewUser) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (role, full_name, email, password, id_number, \
                            employee_number, program, research_areas, max_capacity) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            new.role.as_str(),
            new.full_name,
            new.email,
            new.password,
            new.id_number,
            new.employee_number,
            new.program,
            areas_to_csv(&new.research_areas),
            new.max_capacity,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Find a user by email for authentication. The email column collates
/// NOCASE, so lookup is case-insensitive.
pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    let sql = format!("{SELECT_USER} WHERE email = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![email], row_to_user)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    let sql = format!("{SELECT_USER} WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], row_to_user)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// All supervisor accounts, least loaded first.
pub fn find_supervisors(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let sql = format!("{SELECT_USER} WHERE role = 'supervisor' ORDER BY current_groups ASC, id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let supervisors = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(supervisors)
}

/// Take one supervision slot. The capacity check and the increment are a
/// single guarded UPDATE, so two concurrent activations cannot both take the
/// last slot; returns false when the supervisor is already full.
pub fn try_increment_groups(conn: &Connection, supervisor_id: i64) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE users \
         SET current_groups = current_groups + 1, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%S','now') \
         WHERE id = ?1 AND role = 'supervisor' AND current_groups < max_capacity",
        params![supervisor_id],
    )?;
    Ok(updated == 1)
}
