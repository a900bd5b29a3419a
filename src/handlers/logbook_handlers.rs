use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::identity::AuthUser;
use crate::auth::validate;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::logbook::{self, LogbookFilter, LogbookPatch};
use crate::workflow;

fn default_meeting_no() -> i64 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogbookRequest {
    #[serde(default)]
    pub proposal_id: Option<i64>,
    pub week_no: i64,
    #[serde(default = "default_meeting_no")]
    pub meeting_no: i64,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub date_range: String,
    #[serde(default)]
    pub work_done: Vec<String>,
    #[serde(default)]
    pub discussion: Vec<String>,
    #[serde(default)]
    pub problems: Vec<String>,
    #[serde(default)]
    pub further_notes: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogbookListQuery {
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub supervisor_id: Option<i64>,
    #[serde(default)]
    pub proposal_id: Option<i64>,
}

/// POST /logbooks - Submit a weekly logbook entry (student only)
pub async fn create(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<CreateLogbookRequest>,
) -> Result<HttpResponse, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_optional(&body.term, "Term", 50));
    errors.extend(validate::validate_optional(&body.date_range, "Date range", 100));
    errors.extend(validate::validate_optional(&body.further_notes, "Further notes", 2000));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let submission = workflow::LogbookSubmission {
        proposal_id: body.proposal_id,
        week_no: body.week_no,
        meeting_no: body.meeting_no,
        term: body.term.trim().to_string(),
        date_range: body.date_range.trim().to_string(),
        work_done: body.work_done.clone(),
        discussion: body.discussion.clone(),
        problems: body.problems.clone(),
        further_notes: body.further_notes.trim().to_string(),
    };

    let mut conn = pool.get()?;
    let created = workflow::submit_logbook(&mut conn, &user, &submission)?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /logbooks - List logbooks visible to the caller
pub async fn list(
    pool: web::Data<DbPool>,
    user: AuthUser,
    query: web::Query<LogbookListQuery>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let filter = LogbookFilter {
        student_id: query.student_id,
        supervisor_id: query.supervisor_id,
        proposal_id: query.proposal_id,
        party: (!user.is_coordinator()).then_some(user.id),
    };
    let logbooks = logbook::find_filtered(&conn, &filter)?;
    Ok(HttpResponse::Ok().json(logbooks))
}

/// GET /logbooks/{id} - One logbook, if the caller is party to it
pub async fn read(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let found = logbook::find_by_id(&conn, path.into_inner())?.ok_or(AppError::NotFound)?;
    if !user.is_coordinator()
        && found.student_id != user.id
        && found.supervisor_id != Some(user.id)
    {
        return Err(AppError::PermissionDenied(
            "You are not a party to this logbook".to_string(),
        ));
    }
    Ok(HttpResponse::Ok().json(found))
}

/// PATCH /logbooks/{id} - Content edits, or a review transition when the
/// body carries `status`
pub async fn patch(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<HttpResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("Empty update".to_string()));
    }
    let patches = LogbookPatch::parse_object(&body).map_err(AppError::Validation)?;
    let logbook_id = path.into_inner();

    let target = patches.iter().find_map(|p| match p {
        LogbookPatch::Status(status) => Some(*status),
        _ => None,
    });

    let mut conn = pool.get()?;
    let updated = match target {
        Some(target) => {
            if patches.iter().any(|p| p.is_content()) {
                return Err(AppError::Validation(
                    "Content fields cannot change during a status transition".to_string(),
                ));
            }
            let feedback = patches.iter().find_map(|p| match p {
                LogbookPatch::SupervisorFeedback(f) => Some(f.as_str()),
                _ => None,
            });
            workflow::transition_logbook(&mut conn, &user, logbook_id, target, feedback)?
        }
        None => workflow::edit_logbook(&mut conn, &user, logbook_id, &patches)?,
    };
    Ok(HttpResponse::Ok().json(updated))
}
