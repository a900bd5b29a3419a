use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three actor roles. Stored as lowercase TEXT; every workflow guard
/// dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Supervisor,
    Coordinator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Supervisor => "supervisor",
            Role::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "supervisor" => Ok(Role::Supervisor),
            "coordinator" => Ok(Role::Coordinator),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Internal user record for authentication, password hash included.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub id_number: Option<String>,
    pub employee_number: Option<String>,
    pub program: Option<String>,
    pub research_areas: Vec<String>,
    pub current_groups: i64,
    pub max_capacity: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Safe version for API responses, without the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: i64,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub id_number: Option<String>,
    pub employee_number: Option<String>,
    pub program: Option<String>,
    pub research_areas: Vec<String>,
    pub current_groups: i64,
    pub max_capacity: i64,
    pub created_at: String,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        UserPublic {
            id: u.id,
            role: u.role,
            full_name: u.full_name,
            email: u.email,
            id_number: u.id_number,
            employee_number: u.employee_number,
            program: u.program,
            research_areas: u.research_areas,
            current_groups: u.current_groups,
            max_capacity: u.max_capacity,
            created_at: u.created_at,
        }
    }
}

/// New user data for registration. The password is already hashed.
pub struct NewUser {
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub id_number: Option<String>,
    pub employee_number: Option<String>,
    pub program: Option<String>,
    pub research_areas: Vec<String>,
    pub max_capacity: i64,
}

/// Research areas are stored as a comma-separated TEXT column.
pub fn areas_to_csv(areas: &[String]) -> String {
    areas
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn areas_from_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}
