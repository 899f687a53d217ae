// Product pipeline: ingestion, processing, and the orchestrator that runs them in order

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod schedule;

pub use orchestrator::{FilesCreated, PipelineOrchestrator, PipelineOutcome};
