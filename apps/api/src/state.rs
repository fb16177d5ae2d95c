use std::sync::Arc;

use crate::jobs::runner::JobQueue;
use crate::roadmap::store::RoadmapStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read side of roadmap persistence; writes only happen inside the pipeline.
    pub store: Arc<dyn RoadmapStore>,
    /// Publishes goal events to the job runner.
    pub jobs: JobQueue,
}
