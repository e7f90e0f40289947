//! Training & Evaluation Engine
//!
//! Fits the final forest on the whole training set, scores it on an optional
//! hold-out set and runs k-fold cross-validation on the training data alone.
//! Cross-validation is diagnostic: it never replaces the returned model.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CV_FOLDS, DEFAULT_N_ESTIMATORS, DEFAULT_SEED};
use crate::logic::error::{ModelingError, PipelineResult};
use crate::logic::features::{extract, FeatureEncoder, FeatureFrame, FeatureSpec};
use crate::logic::table::Table;

use super::artifact::ModelArtifact;
use super::cv::{cross_validate, CrossValidation, Deadline};
use super::forest::{ForestParams, MaxFeatures, RandomForest};
use super::metrics::{accuracy, ClassificationReport, ConfusionMatrix};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Trees in the forest
    pub n_estimators: usize,

    /// Seed for bootstrap draws, feature sampling and fold assignment
    pub seed: u64,

    /// Cross-validation folds (k >= 2)
    pub cv_folds: usize,

    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,

    /// Abort cross-validation after this many seconds
    pub cv_deadline_secs: Option<u64>,

    /// Worker threads (0 = one per CPU core)
    pub workers: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            seed: DEFAULT_SEED,
            cv_folds: DEFAULT_CV_FOLDS,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            cv_deadline_secs: None,
            workers: 0,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ModelingError> {
        if self.n_estimators == 0 {
            return Err(ModelingError::InvalidConfig("n_estimators must be at least 1".into()));
        }
        if self.cv_folds < 2 {
            return Err(ModelingError::InvalidConfig(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.min_samples_split < 2 {
            return Err(ModelingError::InvalidConfig("min_samples_split must be at least 2".into()));
        }
        if let MaxFeatures::Fixed(0) = self.max_features {
            return Err(ModelingError::InvalidConfig("max_features must be at least 1".into()));
        }
        Ok(())
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
            bootstrap: self.bootstrap,
            seed: self.seed,
        }
    }

    fn actual_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            self.workers
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Point metrics on the hold-out set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldoutEvaluation {
    /// Rows scored (confusion matrix cells sum to this)
    pub rows: usize,
    pub accuracy: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub report: ClassificationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model_id: String,
    pub target: String,
    pub features: Vec<String>,
    pub classes: Vec<String>,
    pub training_rows: usize,
    /// Unset when no hold-out set was supplied
    pub holdout: Option<HoldoutEvaluation>,
    pub cross_validation: CrossValidation,
}

impl EvaluationReport {
    pub fn holdout_accuracy(&self) -> Option<f64> {
        self.holdout.as_ref().map(|h| h.accuracy)
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: EvaluationReport,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct TrainingEngine {
    config: TrainingConfig,
}

impl TrainingEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Extract features from tables, then train.
    ///
    /// A missing feature or target column fails here, before any fit.
    pub fn train_from_tables(
        &self,
        train: &Table,
        spec: &FeatureSpec,
        holdout: Option<&Table>,
    ) -> PipelineResult<TrainingOutcome> {
        let train_frame = extract(train, spec)?;
        let holdout_frame = holdout.map(|t| extract(t, spec)).transpose()?;
        self.train(&train_frame, holdout_frame.as_ref())
    }

    pub fn train(&self, train: &FeatureFrame, holdout: Option<&FeatureFrame>) -> PipelineResult<TrainingOutcome> {
        self.config.validate()?;
        if train.is_empty() {
            return Err(ModelingError::EmptyTrainingSet.into());
        }

        let labels = train.label_vector()?;
        let mut classes = labels.clone();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ModelingError::SingleClass {
                class: classes.pop().unwrap_or_default(),
            }
            .into());
        }

        let encoder = FeatureEncoder::fit(train);
        let matrix = encoder.encode(train)?;
        matrix.ensure_complete()?;
        let class_index: HashMap<&str, usize> = classes.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
        let y: Vec<usize> = labels.iter().map(|l| class_index[l.as_str()]).collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.actual_workers())
            .build()
            .map_err(|e| ModelingError::InvalidConfig(format!("worker pool: {}", e)))?;

        let params = self.config.forest_params();
        let deadline = self
            .config
            .cv_deadline_secs
            .map(|secs| Deadline::after(Duration::from_secs(secs)));

        log::info!(
            "Training forest: {} trees, {} rows, {} features, {} classes",
            params.n_estimators,
            matrix.n_rows(),
            matrix.n_features(),
            classes.len()
        );

        let (forest, cross_validation) = pool.install(|| -> PipelineResult<_> {
            let forest = RandomForest::fit(matrix.values(), &y, classes.len(), &params, None)?;
            let cv = cross_validate(
                matrix.values(),
                &y,
                classes.len(),
                &params,
                self.config.cv_folds,
                deadline.as_ref(),
            )?;
            Ok((forest, cv))
        })?;

        log::info!(
            "Cross-validation ({} folds): mean accuracy {:.4} (std {:.4})",
            cross_validation.folds,
            cross_validation.mean,
            cross_validation.std_dev()
        );

        let artifact = ModelArtifact::new(train.target(), classes, encoder, forest);

        let holdout = holdout.map(|h| evaluate(&artifact, h)).transpose()?;
        if let Some(h) = &holdout {
            log::info!("Hold-out accuracy: {:.4} on {} rows", h.accuracy, h.rows);
        }

        let report = EvaluationReport {
            model_id: artifact.id.to_string(),
            target: artifact.target.clone(),
            features: artifact.feature_columns().to_vec(),
            classes: artifact.classes.clone(),
            training_rows: train.n_rows(),
            holdout,
            cross_validation,
        };

        Ok(TrainingOutcome { artifact, report })
    }
}

/// Score the artifact on a hold-out frame.
///
/// Every row is scored. Categories unseen in training take the encoder's
/// reserved code; a missing feature value or label is an error.
pub fn evaluate(artifact: &ModelArtifact, holdout: &FeatureFrame) -> PipelineResult<HoldoutEvaluation> {
    if holdout.is_empty() {
        return Err(ModelingError::InvalidConfig("hold-out set is empty".into()).into());
    }
    let truth = holdout.label_vector()?;
    let predicted = artifact.predict(holdout)?;

    let confusion_matrix = ConfusionMatrix::from_predictions(&truth, &predicted);
    let report = ClassificationReport::from_confusion(&confusion_matrix);

    Ok(HoldoutEvaluation {
        rows: truth.len(),
        accuracy: accuracy(&truth, &predicted),
        confusion_matrix,
        report,
    })
}
