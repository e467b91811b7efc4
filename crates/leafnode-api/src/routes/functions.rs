//! Job endpoints: POST /functions/v1/{job}

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use bytes::Bytes;
use leafnode_jobs::{JobKind, JobRequest};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAdmin;
use super::types::{FunctionRequest, FunctionResponse};

/// An absent, blank or `null` body means "work through the backlog"
fn parse_request(body: &Bytes) -> Result<FunctionRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FunctionRequest::default());
    }
    serde_json::from_slice::<Option<FunctionRequest>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

/// POST /functions/v1/{job}
async fn run_job(
    RequireAdmin(caller): RequireAdmin,
    State(state): State<AppState>,
    Path(job): Path<String>,
    body: Bytes,
) -> Result<Json<FunctionResponse>, ApiError> {
    let kind: JobKind = job.parse()?;
    let request = parse_request(&body)?;

    debug!(
        "{} called by {} (ids: {:?}, limit: {:?})",
        kind,
        caller.label(),
        request.ids.as_ref().map(Vec::len),
        request.limit
    );

    let summary = state
        .jobs
        .run(
            kind,
            JobRequest {
                ids: request.ids,
                limit: request.limit,
            },
        )
        .await?;

    info!("{} finished for {}", kind, caller.label());
    Ok(Json(FunctionResponse::from_summary(kind.as_str(), summary)))
}

/// Create job routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/functions/v1/{job}", post(run_job))
}
