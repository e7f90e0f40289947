//! Pipeline Configuration
//!
//! Loaded from a JSON file when one is given, otherwise from `ANALYTICS_*`
//! environment variables with defaults from `constants.rs`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    get_f64, get_optional, get_string, get_u64, get_usize, parse_list, DEFAULT_CV_FOLDS,
    DEFAULT_FEATURE_COLUMNS, DEFAULT_FLOW_PATH, DEFAULT_GROUND_TRUTH_PATH, DEFAULT_HOLDOUT_FRACTION,
    DEFAULT_JOIN_KEYS, DEFAULT_N_ESTIMATORS, DEFAULT_SCHEMA_PATH, DEFAULT_SEED, DEFAULT_TARGET_COLUMN,
};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::explore::ViewColumns;
use crate::logic::features::FeatureSpec;
use crate::logic::linkage::CompositeKey;
use crate::logic::model::TrainingConfig;

/// Input files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    pub flow_path: PathBuf,
    pub ground_truth_path: PathBuf,
    /// Descriptor for a header-less flow file; `None` = flow file has a header
    pub schema_path: Option<PathBuf>,
    /// Headered hold-out table with feature and target columns; replaces the split
    #[serde(default)]
    pub holdout_path: Option<PathBuf>,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            flow_path: PathBuf::from(DEFAULT_FLOW_PATH),
            ground_truth_path: PathBuf::from(DEFAULT_GROUND_TRUTH_PATH),
            schema_path: Some(PathBuf::from(DEFAULT_SCHEMA_PATH)),
            holdout_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write the trained artifact
    pub persist: bool,
    /// Artifact directory (default: local data dir)
    pub artifact_dir: Option<PathBuf>,
    /// Hex AES-256 key; artifact is sealed when set
    pub key_hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: DataSources,
    pub join_keys: CompositeKey,
    pub features: FeatureSpec,
    pub training: TrainingConfig,
    /// Share of merged rows held out for evaluation; `None` or 0 disables it.
    /// Ignored when `sources.holdout_path` is set.
    pub holdout_fraction: Option<f64>,
    pub view: ViewColumns,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: DataSources::default(),
            join_keys: CompositeKey::from_pairs(DEFAULT_JOIN_KEYS),
            features: FeatureSpec::new(DEFAULT_FEATURE_COLUMNS, DEFAULT_TARGET_COLUMN),
            training: TrainingConfig::default(),
            holdout_fraction: Some(DEFAULT_HOLDOUT_FRACTION),
            view: ViewColumns::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file; absent fields take their defaults
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Build from environment variables; a malformed `ANALYTICS_JOIN_KEYS` is a join error
    pub fn from_env() -> PipelineResult<Self> {
        let schema_path = match get_optional("ANALYTICS_SCHEMA_PATH") {
            Some(p) if p.eq_ignore_ascii_case("none") => None,
            Some(p) => Some(PathBuf::from(p)),
            None => Some(PathBuf::from(DEFAULT_SCHEMA_PATH)),
        };

        let join_keys = match get_optional("ANALYTICS_JOIN_KEYS") {
            Some(raw) => CompositeKey::parse(&raw)?,
            None => CompositeKey::from_pairs(DEFAULT_JOIN_KEYS),
        };

        let features = get_optional("ANALYTICS_FEATURES")
            .map(|raw| parse_list(&raw))
            .unwrap_or_else(|| DEFAULT_FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect());

        let holdout = get_f64("ANALYTICS_HOLDOUT_FRACTION", DEFAULT_HOLDOUT_FRACTION);

        Ok(Self {
            sources: DataSources {
                flow_path: PathBuf::from(get_string("ANALYTICS_FLOW_PATH", DEFAULT_FLOW_PATH)),
                ground_truth_path: PathBuf::from(get_string("ANALYTICS_GT_PATH", DEFAULT_GROUND_TRUTH_PATH)),
                schema_path,
                holdout_path: get_optional("ANALYTICS_HOLDOUT_PATH").map(PathBuf::from),
            },
            join_keys,
            features: FeatureSpec::new(&features, &get_string("ANALYTICS_TARGET", DEFAULT_TARGET_COLUMN)),
            training: TrainingConfig {
                n_estimators: get_usize("ANALYTICS_N_ESTIMATORS", DEFAULT_N_ESTIMATORS),
                seed: get_u64("ANALYTICS_SEED", DEFAULT_SEED),
                cv_folds: get_usize("ANALYTICS_CV_FOLDS", DEFAULT_CV_FOLDS),
                cv_deadline_secs: get_optional("ANALYTICS_CV_DEADLINE_SECS").and_then(|s| s.trim().parse().ok()),
                workers: get_usize("ANALYTICS_WORKERS", 0),
                ..TrainingConfig::default()
            },
            holdout_fraction: (holdout > 0.0).then_some(holdout),
            view: ViewColumns::default(),
            output: OutputConfig {
                persist: get_optional("ANALYTICS_PERSIST").map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true")),
                artifact_dir: get_optional("ANALYTICS_MODEL_DIR").map(PathBuf::from),
                key_hex: get_optional("ANALYTICS_MODEL_KEY"),
            },
        })
    }

    /// JSON file if a path is given, environment otherwise
    pub fn resolve(path: Option<&Path>) -> PipelineResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_env(),
        }
    }
}
