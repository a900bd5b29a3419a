use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::identity::AuthUser;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::matching;
use crate::models::{proposal, settings, user};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankQuery {
    #[serde(default)]
    pub research_area: String,
}

#[derive(Deserialize)]
pub struct DuplicateQuery {
    pub title: String,
}

/// GET /matching/supervisors - Ranked supervisor candidates for an area
pub async fn rank_supervisors(
    pool: web::Data<DbPool>,
    _user: AuthUser,
    query: web::Query<RankQuery>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let candidates = user::find_supervisors(&conn)?;
    let ranked = matching::rank_supervisors(&query.research_area, &candidates);
    Ok(HttpResponse::Ok().json(ranked))
}

/// GET /matching/duplicate-check - Advisory similarity score for a title
pub async fn duplicate_check(
    pool: web::Data<DbPool>,
    _user: AuthUser,
    query: web::Query<DuplicateQuery>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let config = settings::get(&conn)?;
    let existing_titles = proposal::all_titles(&conn)?;
    let check =
        matching::duplicate_check(&query.title, &existing_titles, config.similarity_threshold);
    Ok(HttpResponse::Ok().json(check))
}
