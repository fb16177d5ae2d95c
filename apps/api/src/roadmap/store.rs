//! Persistence writer for generated roadmaps.
//!
//! CRITICAL: `create` always INSERTs. It never reads, checks for duplicates,
//! or updates, so a retried job writes a second row.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::roadmap::RoadmapRecord;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid user reference '{0}'")]
    InvalidUserReference(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Input to a single roadmap write. `user_id` is still the opaque event value.
#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub user_id: String,
    pub goal: String,
    pub level: Value,
    pub weeks: Vec<Value>,
}

/// Backing store for roadmaps. Carried by the pipeline as `Arc<dyn RoadmapStore>`.
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    async fn create(&self, roadmap: NewRoadmap) -> Result<RoadmapRecord, StorageError>;

    /// All roadmaps of a user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RoadmapRecord>, StorageError>;
}

/// Resolves the opaque event user id into the store's user reference.
pub fn user_reference(user_id: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(user_id.trim())
        .map_err(|_| StorageError::InvalidUserReference(user_id.to_string()))
}

/// Casts a draft level into the text column. Scalars are stringified;
/// structured values and null do not fit.
pub fn level_text(level: &Value) -> Result<String, StorageError> {
    match level {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(StorageError::SchemaMismatch(
            format!("level must be a scalar, got {level}"),
        )),
    }
}

/// Postgres-backed roadmap store over the `roadmaps` table.
#[derive(Clone)]
pub struct PgRoadmapStore {
    pool: PgPool,
}

impl PgRoadmapStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoadmapStore for PgRoadmapStore {
    async fn create(&self, roadmap: NewRoadmap) -> Result<RoadmapRecord, StorageError> {
        let user_id = user_reference(&roadmap.user_id)?;
        let level = level_text(&roadmap.level)?;
        let weeks = Value::Array(roadmap.weeks);

        let record = sqlx::query_as::<_, RoadmapRecord>(
            r#"
            INSERT INTO roadmaps (id, user_id, goal, level, weeks)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, goal, level, weeks, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&roadmap.goal)
        .bind(&level)
        .bind(&weeks)
        .fetch_one(&self.pool)
        .await?;

        info!(roadmap_id = %record.id, %user_id, "Roadmap persisted");
        Ok(record)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RoadmapRecord>, StorageError> {
        let records = sqlx::query_as::<_, RoadmapRecord>(
            r#"
            SELECT id, user_id, goal, level, weeks, created_at
            FROM roadmaps
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
