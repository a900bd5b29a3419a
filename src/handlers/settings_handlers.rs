use actix_web::{HttpResponse, web};

use crate::auth::identity::AuthUser;
use crate::auth::validate;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::settings::{self, Settings};

/// GET /settings - The system configuration (readable by any authenticated user)
pub async fn show(pool: web::Data<DbPool>, _user: AuthUser) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let config = settings::get(&conn)?;
    Ok(HttpResponse::Ok().json(config))
}

/// PUT /settings - Replace the system configuration (coordinator only)
pub async fn update(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<Settings>,
) -> Result<HttpResponse, AppError> {
    if !user.is_coordinator() {
        return Err(AppError::PermissionDenied(
            "Only a coordinator may change settings".to_string(),
        ));
    }

    let mut errors = Vec::new();
    if body.max_supervision_limit < 1 {
        errors.push("Max supervision limit must be at least 1".to_string());
    }
    if !(0..=100).contains(&body.similarity_threshold) {
        errors.push("Similarity threshold must be between 0 and 100".to_string());
    }
    errors.extend(validate::validate_required(&body.logbook_deadline, "Logbook deadline", 100));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let conn = pool.get()?;
    settings::update(&conn, &body)?;
    let updated = settings::get(&conn)?;
    Ok(HttpResponse::Ok().json(updated))
}
