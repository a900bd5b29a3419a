use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};

use crate::auth::token;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::Role;

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
///
/// Handlers take this as a parameter; extraction failure short-circuits the
/// request with 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

impl AuthUser {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_supervisor(&self) -> bool {
        self.role == Role::Supervisor
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve(req))
    }
}

fn resolve(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let bearer = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let pool = req
        .app_data::<web::Data<DbPool>>()
        .ok_or_else(|| AppError::Internal("Database pool is not configured".to_string()))?;
    let conn = pool.get()?;

    token::verify(&conn, bearer)
}
