use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(rusqlite::Error),
    Pool(r2d2::Error),
    Hash(String),
    Internal(String),
    Unauthorized(String),
    PermissionDenied(String),
    Validation(String),
    Conflict(String),
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Pool(e) => write!(f, "Pool error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Internal(e) => write!(f, "Internal error: {e}"),
            AppError::Unauthorized(e) => write!(f, "{e}"),
            AppError::PermissionDenied(e) => write!(f, "{e}"),
            AppError::Validation(e) => write!(f, "{e}"),
            AppError::Conflict(e) => write!(f, "{e}"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |msg: &str| serde_json::json!({ "error": msg });
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(body(msg)),
            AppError::PermissionDenied(msg) => HttpResponse::Forbidden().json(body(msg)),
            AppError::Validation(msg) => HttpResponse::BadRequest().json(body(msg)),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(body(msg)),
            AppError::NotFound => HttpResponse::NotFound().json(body("Not found")),
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().json(body("Internal server error"))
            }
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Pool(e)
    }
}
