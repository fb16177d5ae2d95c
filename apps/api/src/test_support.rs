//! Test doubles shared by unit tests: a scripted provider and an in-memory store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::llm_client::{ChatMessage, GenerationProvider, ProviderError};
use crate::models::roadmap::RoadmapRecord;
use crate::roadmap::store::{level_text, user_reference, NewRoadmap, RoadmapStore, StorageError};

/// A roadmap reply with `weeks` numbered entries of two topics each.
pub fn roadmap_json(level: &str, weeks: usize) -> String {
    let weeks: Vec<Value> = (1..=weeks)
        .map(|w| json!({"week": w, "topics": [format!("topic {w}a"), format!("topic {w}b")]}))
        .collect();
    json!({"level": level, "weeks": weeks}).to_string()
}

type Responder = Box<dyn Fn(&[ChatMessage]) -> Result<String, ProviderError> + Send + Sync>;

/// Provider that replays canned replies in order, or answers through a closure.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: impl IntoIterator<Item = String>) -> Self {
        Self::new(replies.into_iter().map(Ok))
    }

    pub fn from_fn(
        responder: impl Fn(&[ChatMessage]) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(messages.to_vec());

        // Give concurrently running pipelines a chance to interleave.
        tokio::task::yield_now().await;

        if let Some(responder) = &self.responder {
            return responder(messages);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyContent))
    }
}

/// In-memory `RoadmapStore` with the same casting rules as Postgres.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RoadmapRecord>>,
    pending_failures: AtomicUsize,
}

impl MemoryStore {
    /// A store whose next `n` writes fail with a database error.
    pub fn failing_next(n: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            pending_failures: AtomicUsize::new(n),
        }
    }

    pub fn records(&self) -> Vec<RoadmapRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoadmapStore for MemoryStore {
    async fn create(&self, roadmap: NewRoadmap) -> Result<RoadmapRecord, StorageError> {
        let should_fail = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }

        let record = RoadmapRecord {
            id: Uuid::new_v4(),
            user_id: user_reference(&roadmap.user_id)?,
            goal: roadmap.goal,
            level: level_text(&roadmap.level)?,
            weeks: Value::Array(roadmap.weeks),
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RoadmapRecord>, StorageError> {
        let mut records: Vec<RoadmapRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
