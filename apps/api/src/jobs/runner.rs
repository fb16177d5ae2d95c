//! Job runner: dispatches goal events to the roadmap pipeline.
//!
//! Each job runs in its own task. A failed run is retried from scratch
//! (provider call and storage write included) until the retry budget is
//! spent; then the job is marked failed in the registry. Malformed output
//! and provider outages are retried the same way.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::jobs::registry::JobRegistry;
use crate::roadmap::event::GoalReceived;
use crate::roadmap::pipeline::RoadmapPipeline;

const QUEUE_CAPACITY: usize = 256;

/// How often completed jobs older than the retention window are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,
}

/// How often and how patiently a failed job is rerun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before `attempt` (1-based): none for the first, then 1x, 2x, 4x the base.
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }
}

struct Job {
    id: Uuid,
    event: GoalReceived,
}

/// Publishing side of the runner. Dropping every clone stops the runner
/// once queued jobs have drained.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
    registry: JobRegistry,
}

impl JobQueue {
    /// Enqueues one delivery of `event` and returns its job id.
    pub async fn publish(&self, event: GoalReceived) -> Result<Uuid, QueueError> {
        let id = Uuid::new_v4();
        self.registry.insert_queued(id, event.id).await;

        if self.sender.send(Job { id, event }).await.is_err() {
            self.registry.remove(id).await;
            return Err(QueueError::Closed);
        }
        Ok(id)
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }
}

pub struct JobRunner {
    pipeline: Arc<RoadmapPipeline>,
    policy: RetryPolicy,
    /// How long a completed job stays queryable.
    retention: Duration,
    registry: JobRegistry,
    receiver: mpsc::Receiver<Job>,
}

impl JobRunner {
    /// Spawns the runner loop and returns the queue feeding it.
    pub fn spawn(
        pipeline: Arc<RoadmapPipeline>,
        policy: RetryPolicy,
        retention: Duration,
    ) -> (JobQueue, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let registry = JobRegistry::default();

        let runner = JobRunner {
            pipeline,
            policy,
            retention,
            registry: registry.clone(),
            receiver,
        };
        let handle = tokio::spawn(runner.run());

        (JobQueue { sender, registry }, handle)
    }

    async fn run(mut self) {
        info!(
            retries = self.policy.retries,
            base_backoff_ms = self.policy.base_backoff.as_millis() as u64,
            retention_secs = self.retention.as_secs(),
            "Job runner started"
        );

        let mut tasks = JoinSet::new();
        let mut prune_timer = tokio::time::interval(PRUNE_INTERVAL);
        prune_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                job = self.receiver.recv() => match job {
                    Some(job) => {
                        tasks.spawn(execute(
                            Arc::clone(&self.pipeline),
                            self.registry.clone(),
                            self.policy,
                            job,
                        ));
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Roadmap job task aborted");
                    }
                }
                _ = prune_timer.tick() => self.prune_completed().await,
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Roadmap job task aborted");
            }
        }

        info!("Job runner stopped");
    }

    async fn prune_completed(&self) {
        let Some(cutoff) = retention_cutoff(self.retention) else {
            return;
        };
        let pruned = self.registry.prune_completed(cutoff).await;
        if pruned > 0 {
            info!(pruned, "Job registry: dropped completed jobs");
        } else {
            debug!("Job registry: nothing to prune");
        }
    }
}

/// `None` when the window reaches past the representable time range.
fn retention_cutoff(retention: Duration) -> Option<DateTime<Utc>> {
    let window = chrono::Duration::from_std(retention).ok()?;
    Utc::now().checked_sub_signed(window)
}

async fn execute(
    pipeline: Arc<RoadmapPipeline>,
    registry: JobRegistry,
    policy: RetryPolicy,
    job: Job,
) {
    let max_attempts = policy.max_attempts();
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        let delay = policy.backoff_before(attempt);
        if !delay.is_zero() {
            warn!(
                job_id = %job.id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying roadmap job"
            );
            tokio::time::sleep(delay).await;
        }

        registry.start_attempt(job.id, attempt).await;

        match pipeline.handle(&job.event).await {
            Ok(output) => {
                info!(job_id = %job.id, attempt, "Roadmap job completed");
                registry.complete(job.id, output).await;
                return;
            }
            Err(e) => {
                warn!(
                    job_id = %job.id,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Roadmap job attempt failed"
                );
                last_error = e.to_string();
            }
        }
    }

    error!(
        job_id = %job.id,
        event_id = %job.event.id,
        attempts = max_attempts,
        error = %last_error,
        "Roadmap job failed after exhausting retries"
    );
    registry.fail(job.id, last_error).await;
}
