use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::identity::AuthUser;
use crate::auth::validate;
use crate::db::{self, DbPool};
use crate::errors::AppError;
use crate::models::notification::{self, NotificationKind};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub to_uid: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<NotificationKind>,
}

#[derive(Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub uid: Option<i64>,
}

/// POST /notifications - Send a notification to one recipient
pub async fn create(
    pool: web::Data<DbPool>,
    _user: AuthUser,
    body: web::Json<CreateNotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.title, "Title", 200));
    errors.extend(validate::validate_required(&body.message, "Message", 2000));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let conn = pool.get()?;
    let kind = body.kind.unwrap_or(NotificationKind::Info);
    let id = match notification::create(&conn, body.to_uid, body.title.trim(), body.message.trim(), kind)
    {
        Ok(id) => id,
        Err(e) if db::is_constraint_violation(&e) => {
            return Err(AppError::Validation("Recipient does not exist".to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let created = notification::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /notifications - The caller's notifications, newest first
pub async fn list(
    pool: web::Data<DbPool>,
    user: AuthUser,
    query: web::Query<NotificationListQuery>,
) -> Result<HttpResponse, AppError> {
    if let Some(uid) = query.uid {
        if uid != user.id {
            return Err(AppError::PermissionDenied(
                "Notifications are only visible to their recipient".to_string(),
            ));
        }
    }
    let conn = pool.get()?;
    let notifications = notification::find_for_user(&conn, user.id)?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// PATCH /notifications/{id}/read - Mark one of the caller's notifications
/// read; marking twice is a no-op
pub async fn mark_read(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let conn = pool.get()?;
    let found = notification::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    if found.to_uid != user.id {
        return Err(AppError::PermissionDenied(
            "Notifications are only visible to their recipient".to_string(),
        ));
    }
    notification::mark_read(&conn, id)?;
    let updated = notification::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(updated))
}
