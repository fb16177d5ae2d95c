// In-process job runner standing in for the external event queue.
// Owns retry policy and failure tracking; the pipeline itself never retries.

pub mod handlers;
pub mod registry;
pub mod runner;
