//! Axum route handlers for the Roadmap API.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::roadmap::RoadmapRecord;
use crate::roadmap::event::{GoalReceived, GoalRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGoalResponse {
    pub job_id: Uuid,
    pub event_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// POST /api/v1/goals
///
/// Publishes a goal event and returns immediately. Only the body shape is
/// checked; the goal text itself is not validated.
pub async fn handle_submit_goal(
    State(state): State<AppState>,
    payload: Result<Json<GoalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitGoalResponse>), AppError> {
    let Json(request) = payload?;
    let event = GoalReceived::new(request);
    let event_id = event.id;
    let job_id = state.jobs.publish(event).await?;

    info!(%job_id, %event_id, "Goal event published");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitGoalResponse { job_id, event_id }),
    ))
}

/// GET /api/v1/roadmaps?user_id=
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
    params: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<Vec<RoadmapRecord>>, AppError> {
    let Query(params) = params?;
    let records = state.store.list_for_user(params.user_id).await?;
    Ok(Json(records))
}
