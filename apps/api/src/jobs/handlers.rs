//! Axum route handlers for job status.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::registry::JobRecord;
use crate::state::AppState;

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    job_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<JobRecord>, AppError> {
    let Path(job_id) = job_id?;
    state
        .jobs
        .registry()
        .get(job_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// GET /api/v1/jobs/failed
///
/// Jobs that exhausted their retries.
pub async fn handle_failed_jobs(State(state): State<AppState>) -> Json<Vec<JobRecord>> {
    Json(state.jobs.registry().failed().await)
}
