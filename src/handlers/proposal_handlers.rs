use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::identity::AuthUser;
use crate::auth::validate;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::proposal::{self, ProposalFilter, ProposalPatch};
use crate::workflow;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub research_area: String,
    #[serde(default)]
    pub group_members: String,
    #[serde(default)]
    pub supervisor_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalListQuery {
    #[serde(default)]
    pub submitted_by: Option<i64>,
    #[serde(default)]
    pub supervisor_id: Option<i64>,
}

/// POST /proposals - Submit a new proposal (student only)
pub async fn create(
    pool: web::Data<DbPool>,
    user: AuthUser,
    body: web::Json<CreateProposalRequest>,
) -> Result<HttpResponse, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.title, "Title", 200));
    errors.extend(validate::validate_required(&body.description, "Description", 4000));
    errors.extend(validate::validate_optional(&body.research_area, "Research area", 200));
    errors.extend(validate::validate_optional(&body.group_members, "Group members", 500));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let submission = workflow::ProposalSubmission {
        title: body.title.trim().to_string(),
        description: body.description.trim().to_string(),
        research_area: body.research_area.trim().to_string(),
        group_members: body.group_members.trim().to_string(),
        supervisor_id: body.supervisor_id,
    };

    let mut conn = pool.get()?;
    let created = workflow::submit_proposal(&mut conn, &user, &submission)?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /proposals - List proposals visible to the caller
pub async fn list(
    pool: web::Data<DbPool>,
    user: AuthUser,
    query: web::Query<ProposalListQuery>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let filter = ProposalFilter {
        submitted_by: query.submitted_by,
        supervisor_id: query.supervisor_id,
        party: (!user.is_coordinator()).then_some(user.id),
    };
    let proposals = proposal::find_filtered(&conn, &filter)?;
    Ok(HttpResponse::Ok().json(proposals))
}

/// GET /proposals/{id} - One proposal, if the caller is party to it
pub async fn read(
    pool: web::Data<DbPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let found = proposal::find_by_id(&conn, path.into_inner())?.ok_or(AppError::NotFound)?;
    if !user.is_coordinator()
        && found.submitted_by != user.id
        && found.supervisor_id != Some(user.id)
    {
        return Err(AppError::PermissionDenied(
            "You are not a party to this proposal".to_string(),
        ));
    }
    Ok(HttpResponse::Ok().json(found))
}

/// PATCH /proposals/{id} - Content edits, or a status transition when the
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
    let patches = ProposalPatch::parse_object(&body).map_err(AppError::Validation)?;
    let proposal_id = path.into_inner();

    let target = patches.iter().find_map(|p| match p {
        ProposalPatch::Status(status) => Some(*status),
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
                ProposalPatch::SupervisorFeedback(f) | ProposalPatch::CoordinatorFeedback(f) => {
                    Some(f.as_str())
                }
                _ => None,
            });
            workflow::transition_proposal(&mut conn, &user, proposal_id, target, feedback)?
        }
        None => workflow::edit_proposal(&mut conn, &user, proposal_id, &patches)?,
    };
    Ok(HttpResponse::Ok().json(updated))
}
