use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::auth::identity::AuthUser;
use crate::auth::{password, token, validate};
use crate::db::{self, DbPool};
use crate::errors::AppError;
use crate::models::user::{NewUser, Role, UserPublic};
use crate::models::{settings, user};

/// One message for unknown email and wrong password, so login attempts
/// cannot probe which addresses exist.
const BAD_LOGIN: &str = "Invalid email or password";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub employee_number: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub research_areas: Vec<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserPublic,
}

/// POST /auth/register - Create an account and open a session
pub async fn register(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.full_name, "Full name", 100));
    errors.extend(validate::validate_email(&body.email));
    errors.extend(validate::validate_password(&body.password));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let conn = pool.get()?;
    let config = settings::get(&conn)?;
    let hashed = password::hash_password(&body.password)?;

    let new_user = NewUser {
        role: body.role,
        full_name: body.full_name.trim().to_string(),
        email: body.email.trim().to_string(),
        password: hashed,
        id_number: body.id_number.clone(),
        employee_number: body.employee_number.clone(),
        program: body.program.clone(),
        research_areas: body.research_areas.clone(),
        max_capacity: config.max_supervision_limit,
    };
    let user_id = match user::create(&conn, &new_user) {
        Ok(id) => id,
        Err(e) if db::is_constraint_violation(&e) => {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let session_token = token::issue(&conn, user_id)?;
    let created = user::find_by_id(&conn, user_id)?.ok_or(AppError::NotFound)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        success: true,
        token: session_token,
        user: UserPublic::from(created),
    }))
}

/// POST /auth/login - Verify credentials and open a session
pub async fn login(
    pool: web::Data<DbPool>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;

    let found = user::find_by_email(&conn, body.email.trim())?
        .ok_or_else(|| AppError::Unauthorized(BAD_LOGIN.to_string()))?;
    if !password::verify_password(&body.password, &found.password)? {
        return Err(AppError::Unauthorized(BAD_LOGIN.to_string()));
    }

    let session_token = token::issue(&conn, found.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        success: true,
        token: session_token,
        user: UserPublic::from(found),
    }))
}

/// GET /auth/me - The caller's own account, from the bearer token
pub async fn me(pool: web::Data<DbPool>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let found = user::find_by_id(&conn, user.id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": UserPublic::from(found) })))
}
