//! In-memory record of every job the runner has seen and where it ended up.
//!
//! This is the runner's failure queue: jobs that exhaust their retries stay
//! here in the `failed` state with the last error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::roadmap::models::RoadmapOutput;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running { attempt: u32 },
    Completed { output: RoadmapOutput },
    Failed { error: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    #[serde(flatten)]
    pub state: JobState,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobRegistry {
    pub async fn insert_queued(&self, id: Uuid, event_id: Uuid) {
        let now = Utc::now();
        self.jobs.write().await.insert(
            id,
            JobRecord {
                id,
                event_id,
                state: JobState::Queued,
                attempts: 0,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub async fn remove(&self, id: Uuid) {
        self.jobs.write().await.remove(&id);
    }

    pub async fn start_attempt(&self, id: Uuid, attempt: u32) {
        self.update(id, |job| {
            job.attempts = attempt;
            job.state = JobState::Running { attempt };
        })
        .await;
    }

    pub async fn complete(&self, id: Uuid, output: RoadmapOutput) {
        self.update(id, |job| job.state = JobState::Completed { output })
            .await;
    }

    pub async fn fail(&self, id: Uuid, error: String) {
        self.update(id, |job| job.state = JobState::Failed { error })
            .await;
    }

    pub async fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Jobs that ran out of retries, oldest first.
    pub async fn failed(&self) -> Vec<JobRecord> {
        let mut failed: Vec<JobRecord> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| matches!(job.state, JobState::Failed { .. }))
            .cloned()
            .collect();
        failed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        failed
    }

    /// Drops completed jobs last touched at or before `cutoff` and returns
    /// how many went. Failed jobs are kept for the failure queue.
    pub async fn prune_completed(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| {
            !(matches!(job.state, JobState::Completed { .. }) && job.updated_at <= cutoff)
        });
        before - jobs.len()
    }

    /// Terminal states are final; later updates are dropped.
    async fn update(&self, id: Uuid, apply: impl FnOnce(&mut JobRecord)) {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            if job.state.is_terminal() {
                return;
            }
            apply(job);
            job.updated_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let registry = JobRegistry::default();
        let id = Uuid::new_v4();
        registry.insert_queued(id, Uuid::new_v4()).await;
        assert_eq!(registry.get(id).await.unwrap().state, JobState::Queued);

        registry.start_attempt(id, 1).await;
        let job = registry.get(id).await.unwrap();
        assert_eq!(job.state, JobState::Running { attempt: 1 });
        assert_eq!(job.attempts, 1);
        assert!(!job.state.is_terminal());

        registry.fail(id, "boom".to_string()).await;
        let job = registry.get(id).await.unwrap();
        assert!(job.state.is_terminal());
        assert_eq!(registry.failed().await.len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let registry = JobRegistry::default();
        let id = Uuid::new_v4();
        registry.insert_queued(id, Uuid::new_v4()).await;
        registry.fail(id, "boom".to_string()).await;
        registry.start_attempt(id, 2).await;

        let job = registry.get(id).await.unwrap();
        assert_eq!(
            job.state,
            JobState::Failed {
                error: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_prune_drops_only_old_completed_jobs() {
        let registry = JobRegistry::default();
        let output = RoadmapOutput {
            user_id: "u1".to_string(),
            level: json!("beginner"),
            weeks: vec![],
        };

        let done = Uuid::new_v4();
        let failed = Uuid::new_v4();
        let running = Uuid::new_v4();
        for id in [done, failed, running] {
            registry.insert_queued(id, Uuid::new_v4()).await;
            registry.start_attempt(id, 1).await;
        }
        registry.complete(done, output.clone()).await;
        registry.fail(failed, "boom".to_string()).await;

        // A cutoff in the past keeps everything.
        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(registry.prune_completed(past).await, 0);
        assert!(registry.get(done).await.is_some());

        assert_eq!(registry.prune_completed(Utc::now()).await, 1);
        assert!(registry.get(done).await.is_none());
        assert!(registry.get(failed).await.is_some());
        assert!(registry.get(running).await.is_some());
        assert_eq!(registry.failed().await.len(), 1);
    }

    #[tokio::test]
    async fn test_updates_to_unknown_jobs_are_ignored() {
        let registry = JobRegistry::default();
        let id = Uuid::new_v4();
        registry.start_attempt(id, 1).await;
        assert!(registry.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_record_serializes_flat_status() {
        let registry = JobRegistry::default();
        let id = Uuid::new_v4();
        registry.insert_queued(id, Uuid::new_v4()).await;
        registry
            .complete(
                id,
                RoadmapOutput {
                    user_id: "u1".to_string(),
                    level: json!("beginner"),
                    weeks: vec![],
                },
            )
            .await;

        let value = serde_json::to_value(registry.get(id).await.unwrap()).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["output"]["userId"], "u1");
        assert_eq!(value["id"], json!(id));
    }
}
