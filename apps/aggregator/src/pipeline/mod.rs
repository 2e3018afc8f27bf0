//! The ingestion pipeline: extract, normalize, enrich, deduplicate.

pub mod dedup;
pub mod enricher;
pub mod extractor;
pub mod normalizer;
pub mod prompts;
pub mod runner;
pub mod text;

pub use runner::{Pipeline, PipelineSettings};
