// Goal-to-roadmap pipeline.
// event → prompt → provider → sanitize/validate → persist. Strictly linear.
// All provider calls go through llm_client::GenerationProvider.

pub mod event;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod sanitizer;
pub mod store;
