//! Enrichment run history

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use leafnode_db::EnrichmentRun;
use leafnode_jobs::JobKind;

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAdmin;
use super::types::RunsQuery;

const MAX_RUNS: i64 = 500;

/// GET /api/v1/enrichment/runs (Admin only)
async fn list_runs(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<EnrichmentRun>>, ApiError> {
    let job = match query.job.as_deref() {
        Some(name) => Some(
            name.parse::<JobKind>()
                .map_err(|_| ApiError::BadRequest(format!("Unknown job: {}", name)))?,
        ),
        None => None,
    };

    let runs = state
        .db
        .list_enrichment_runs(job.map(|kind| kind.as_str()), query.limit.clamp(1, MAX_RUNS))
        .await?;
    Ok(Json(runs))
}

/// Create run history routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/enrichment/runs", get(list_runs))
}
