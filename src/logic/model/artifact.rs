//! Model Artifact - a fitted forest bound to its feature layout
//!
//! The artifact carries the encoder fitted at training time and the CRC32
//! layout hash of its feature columns. Prediction on a frame built from any
//! other column set fails with `LayoutMismatch` instead of silently feeding
//! features into the wrong slots.

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::logic::error::{ModelingError, PipelineResult};
use crate::logic::features::{FeatureEncoder, FeatureFrame, FeatureMatrix};
use crate::logic::schema::LAYOUT_VERSION;

use super::forest::RandomForest;

/// Serialized artifact format version
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub version: u32,
    pub layout_version: u8,
    /// Target column the labels came from
    pub target: String,
    /// Label encoding: class index -> label, sorted
    pub classes: Vec<String>,
    pub layout_hash: u32,
    encoder: FeatureEncoder,
    forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(target: &str, classes: Vec<String>, encoder: FeatureEncoder, forest: RandomForest) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            version: ARTIFACT_VERSION,
            layout_version: LAYOUT_VERSION,
            target: target.to_string(),
            classes,
            layout_hash: encoder.layout_hash(),
            encoder,
            forest,
        }
    }

    pub fn feature_columns(&self) -> &[String] {
        self.encoder.columns()
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    fn check_layout(&self, actual: u32) -> Result<(), ModelingError> {
        if actual != self.layout_hash {
            return Err(ModelingError::LayoutMismatch {
                expected: self.layout_hash,
                actual,
            });
        }
        Ok(())
    }

    /// Encode a raw frame with the training-time encoder
    pub fn encode(&self, frame: &FeatureFrame) -> Result<FeatureMatrix, ModelingError> {
        let matrix = self.encoder.encode(frame)?;
        matrix.ensure_complete()?;
        Ok(matrix)
    }

    /// Predicted labels for an encoded matrix
    pub fn predict_matrix(&self, matrix: &FeatureMatrix) -> Result<Vec<String>, ModelingError> {
        self.check_layout(matrix.layout_hash())?;
        matrix.ensure_complete()?;
        Ok(self
            .forest
            .predict(matrix.values())
            .into_iter()
            .map(|c| self.classes[c].clone())
            .collect())
    }

    /// Predicted labels for a raw frame
    pub fn predict(&self, frame: &FeatureFrame) -> Result<Vec<String>, ModelingError> {
        self.predict_matrix(&self.encode(frame)?)
    }

    /// Class probabilities (rows x classes, columns ordered as `classes`)
    pub fn predict_proba(&self, frame: &FeatureFrame) -> Result<Array2<f64>, ModelingError> {
        let matrix = self.encode(frame)?;
        Ok(self.forest.predict_proba(matrix.values()))
    }

    // ========================================================================
    // SERIALIZATION
    // ========================================================================

    pub fn to_bytes(&self) -> PipelineResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse and re-validate the layout binding
    pub fn from_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        artifact.check_layout(artifact.encoder.layout_hash())?;
        if artifact.classes.len() != artifact.forest.n_classes()
            || artifact.feature_columns().len() != artifact.forest.n_features()
        {
            return Err(ModelingError::InvalidConfig(
                "artifact classes or features do not match its forest".into(),
            )
            .into());
        }
        Ok(artifact)
    }

    /// SHA-256 of the serialized artifact, hex encoded
    pub fn checksum(&self) -> PipelineResult<String> {
        Ok(hex::encode(Sha256::digest(self.to_bytes()?)))
    }
}
