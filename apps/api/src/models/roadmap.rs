use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted roadmap. `weeks` is the JSONB array exactly as the provider sent it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadmapRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal: String,
    pub level: String,
    pub weeks: Value,
    pub created_at: DateTime<Utc>,
}
