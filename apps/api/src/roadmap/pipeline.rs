//! Roadmap generation: orchestrates one goal event end to end.
//!
//! Flow: build prompt → provider.generate → parse_roadmap → store.create.
//!
//! Every failure propagates unchanged to the job runner. There is no local
//! retry, and a provider call that was already paid for is not compensated
//! when the write fails afterwards.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::llm_client::{ChatMessage, GenerationProvider, ProviderError};
use crate::roadmap::event::GoalReceived;
use crate::roadmap::models::RoadmapOutput;
use crate::roadmap::prompts::build_roadmap_prompt;
use crate::roadmap::sanitizer::{parse_roadmap, MalformedOutput, ValidationMode};
use crate::roadmap::store::{NewRoadmap, RoadmapStore, StorageError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generation provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    MalformedOutput(#[from] MalformedOutput),

    #[error("storage write failed: {0}")]
    Storage(#[from] StorageError),
}

/// The goal-to-roadmap pipeline with its collaborators injected.
///
/// Built once at startup; shared by every job as `Arc<RoadmapPipeline>`.
pub struct RoadmapPipeline {
    provider: Arc<dyn GenerationProvider>,
    store: Arc<dyn RoadmapStore>,
    validation: ValidationMode,
}

impl RoadmapPipeline {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        store: Arc<dyn RoadmapStore>,
        validation: ValidationMode,
    ) -> Self {
        Self {
            provider,
            store,
            validation,
        }
    }

    /// Runs the pipeline for one event delivery.
    ///
    /// Steps:
    /// 1. build_roadmap_prompt(goal)
    /// 2. provider.generate([user message]) → raw text
    /// 3. parse_roadmap(raw) → RoadmapDraft
    /// 4. store.create(...) → one new record
    pub async fn handle(&self, event: &GoalReceived) -> Result<RoadmapOutput, PipelineError> {
        let request = &event.data;
        info!(
            event_id = %event.id,
            user_id = %request.user_id,
            "Generating roadmap"
        );

        // Step 1 + 2: prompt and provider call
        let prompt = build_roadmap_prompt(&request.goal);
        let raw = self.provider.generate(&[ChatMessage::user(prompt)]).await?;

        // Step 3: sanitize and validate
        let draft = parse_roadmap(&raw, self.validation)?;
        info!(
            event_id = %event.id,
            level = %draft.level,
            weeks = draft.weeks.len(),
            "Roadmap draft validated"
        );

        // Step 4: persist
        self.store
            .create(NewRoadmap {
                user_id: request.user_id.clone(),
                goal: request.goal.clone(),
                level: draft.level.clone(),
                weeks: draft.weeks.clone(),
            })
            .await?;

        Ok(RoadmapOutput {
            user_id: request.user_id.clone(),
            level: draft.level,
            weeks: draft.weeks,
        })
    }
}
