//! Event envelope for "goal received" deliveries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event name the pipeline subscribes to.
pub const GOAL_RECEIVED: &str = "user/goal.received";

/// Payload of a goal event. `user_id` is opaque until the store resolves it.
///
/// No validation is applied to `goal`: empty or adversarial text passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    pub user_id: String,
    pub goal: String,
}

/// A single delivery of a goal event.
///
/// Redelivering the same envelope reruns the whole pipeline; there is no
/// deduplication on `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalReceived {
    pub id: Uuid,
    pub name: String,
    pub data: GoalRequest,
    pub ts: DateTime<Utc>,
}

impl GoalReceived {
    pub fn new(data: GoalRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: GOAL_RECEIVED.to_string(),
            data,
            ts: Utc::now(),
        }
    }
}
