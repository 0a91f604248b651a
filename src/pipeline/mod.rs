// Course page pipeline: field normalization and the batch orchestrator

pub mod orchestrator;
pub mod processing;

pub use orchestrator::{BatchOptions, BatchSummary, PageOutcome, PipelineOrchestrator};
pub use processing::normalize::NormalizationPipeline;
