//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leafnode_auth::AuthError;
use leafnode_db::DbError;
use leafnode_jobs::JobError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body failed field checks
    #[error("Validation failed: {message}")]
    Validation { message: String, errors: Vec<String> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut errors = Vec::new();

        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation {
                message,
                errors: details,
            } => {
                errors = details;
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::Database(DbError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            ApiError::Database(DbError::Duplicate(msg)) => (StatusCode::CONFLICT, msg),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            ApiError::Auth(e) => {
                let status = e.status_code();
                let message = match e {
                    AuthError::PasswordHash(_) => "Internal error".to_string(),
                    AuthError::Jwt(_) => "Invalid token".to_string(),
                    other => other.to_string(),
                };
                (status, message)
            }
            ApiError::Job(JobError::UnknownJob(name)) => {
                (StatusCode::NOT_FOUND, format!("Unknown job: {}", name))
            }
            // Operators need to see which key is missing
            ApiError::Job(JobError::Configuration(msg)) => {
                error!("Job configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Job(JobError::Database(e)) => {
                error!("Job database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });
        if !errors.is_empty() {
            body["errors"] = json!(errors);
        }

        (status, axum::Json(body)).into_response()
    }
}
