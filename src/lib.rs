//! AI Security Analytics - flow ingestion, record linkage and attack classification

pub mod constants;
pub mod logic;

pub use logic::config::PipelineConfig;
pub use logic::error::{PipelineError, RunError, Stage};
pub use logic::pipeline::{run, PipelineOutcome};
