//! Model Module - Training & Evaluation Engine
//!
//! Random forest classifier (bagged CART trees), evaluation metrics,
//! seeded k-fold cross-validation and the layout-bound model artifact.

pub mod artifact;
pub mod cv;
pub mod engine;
pub mod forest;
pub mod metrics;
pub mod tree;

#[cfg(test)]
mod tests;

pub use artifact::ModelArtifact;
pub use cv::{cross_validate, kfold_indices, CrossValidation, Deadline};
pub use engine::{evaluate, EvaluationReport, HoldoutEvaluation, TrainingConfig, TrainingEngine, TrainingOutcome};
pub use forest::{ForestParams, MaxFeatures, RandomForest};
pub use metrics::{accuracy, ClassMetrics, ClassificationReport, ConfusionMatrix};
