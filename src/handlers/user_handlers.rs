use actix_web::{HttpResponse, web};

use crate::auth::identity::AuthUser;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::{self, UserPublic};

/// GET /supervisors - All supervisor accounts with capacity fields
pub async fn list_supervisors(
    pool: web::Data<DbPool>,
    _user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let supervisors: Vec<UserPublic> = user::find_supervisors(&conn)?
        .into_iter()
        .map(UserPublic::from)
        .collect();
    Ok(HttpResponse::Ok().json(supervisors))
}
