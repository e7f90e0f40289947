//! Error taxonomy for the analytics pipeline
//!
//! Every stage validates its own preconditions and fails with one of these
//! kinds. The orchestrator wraps them in [`RunError`] so a failed run always
//! names the stage that stopped it.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Required column/key absent or descriptor malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("column '{column}' is missing from the {table} table")]
    MissingColumn { table: String, column: String },

    #[error("schema descriptor has no 'Name' column")]
    MissingNameColumn,

    #[error("schema descriptor row {row} has no feature name")]
    EmptyName { row: usize },

    #[error("cannot parse {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("record {row} has {width} fields but only {expected} columns are declared")]
    RowTooWide { row: usize, width: usize, expected: usize },
}

impl SchemaError {
    pub fn missing(table: &str, column: &str) -> Self {
        SchemaError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    /// Name of the offending column, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            SchemaError::MissingColumn { column, .. } => Some(column),
            SchemaError::MissingNameColumn => Some("Name"),
            _ => None,
        }
    }
}

/// Fit cannot proceed or a model was misused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelingError {
    #[error("label vector has a single class ('{class}'), need at least two")]
    SingleClass { class: String },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("cannot run {folds}-fold cross-validation on {samples} samples")]
    InvalidFolds { folds: usize, samples: usize },

    #[error("row {row} has no usable value for '{column}'")]
    IncompleteFeatures { row: usize, column: String },

    #[error("feature layout mismatch: model expects {expected:08x}, got {actual:08x}")]
    LayoutMismatch { expected: u32, actual: u32 },

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),
}

/// Model protection failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("key must be 32 bytes, got {0}")]
    InvalidKey(usize),

    #[error("sealed payload is too short")]
    Truncated,

    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed (wrong key or tampered payload)")]
    DecryptFailed,

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("join error: {0}")]
    Join(String),

    #[error("modeling error: {0}")]
    Modeling(#[from] ModelingError),

    #[error("deadline of {limit:?} exceeded during cross-validation")]
    Timeout { limit: Duration },

    #[error("model guard error: {0}")]
    Guard(#[from] GuardError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short kind tag used in logs and the run summary
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Io { .. } => "IOError",
            PipelineError::Schema(_) => "SchemaError",
            PipelineError::Join(_) => "JoinError",
            PipelineError::Modeling(_) => "ModelingError",
            PipelineError::Timeout { .. } => "TimeoutError",
            PipelineError::Guard(_) => "GuardError",
            PipelineError::Serialization(_) => "SerializationError",
        }
    }
}

/// Fallible pipeline stage, in execution order (cleaning cannot fail)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    SchemaResolution,
    Loading,
    Linkage,
    Extraction,
    Training,
    Persistence,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SchemaResolution => "schema resolution",
            Stage::Loading => "loading",
            Stage::Linkage => "record linkage",
            Stage::Extraction => "feature extraction",
            Stage::Training => "training",
            Stage::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

/// Failure of a full run: which stage, and why
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct RunError {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl RunError {
    pub fn new(stage: Stage, error: impl Into<PipelineError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

/// Tag a stage result with its stage
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T, RunError>;
}

impl<T, E: Into<PipelineError>> StageContext<T> for Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T, RunError> {
        self.map_err(|e| RunError::new(stage, e))
    }
}
