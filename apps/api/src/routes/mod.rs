pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::roadmap::handlers as roadmaps;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Roadmap API
        .route("/api/v1/goals", post(roadmaps::handle_submit_goal))
        .route("/api/v1/roadmaps", get(roadmaps::handle_list_roadmaps))
        // Job runner status
        .route("/api/v1/jobs/failed", get(jobs::handle_failed_jobs))
        .route("/api/v1/jobs/:id", get(jobs::handle_get_job))
        .with_state(state)
}
