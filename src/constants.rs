//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Environment variables override these at startup, see `PipelineConfig::from_env`.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "AI Security Analytics";

/// Default raw flow file (header-less UNSW-NB15 partition)
pub const DEFAULT_FLOW_PATH: &str = "data/UNSW-NB15_1.csv";

/// Default ground truth table
pub const DEFAULT_GROUND_TRUTH_PATH: &str = "data/NUSW-NB15_GT.csv";

/// Default schema descriptor for the header-less flow file
pub const DEFAULT_SCHEMA_PATH: &str = "data/NUSW-NB15_features.csv";

/// Default ensemble size
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default random seed (fixed for reproducibility)
pub const DEFAULT_SEED: u64 = 42;

/// Default number of cross-validation folds
pub const DEFAULT_CV_FOLDS: usize = 5;

/// Default hold-out share when no separate hold-out table is given
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;

/// Default target column (ground truth side)
pub const DEFAULT_TARGET_COLUMN: &str = "Attack category";

/// Default feature columns (flow side)
pub const DEFAULT_FEATURE_COLUMNS: &[&str] = &["dur", "sbytes", "dbytes", "spkts", "dpkts", "proto"];

/// Default composite key: (flow column, ground truth column)
pub const DEFAULT_JOIN_KEYS: &[(&str, &str)] = &[
    ("srcip", "Source IP"),
    ("sport", "Source Port"),
    ("dstip", "Destination IP"),
    ("dsport", "Destination Port"),
    ("proto", "Protocol"),
];

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get an env var as string, or the default
pub fn get_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional env var (empty counts as unset)
pub fn get_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Get a numeric env var, or the default when unset or unparsable
pub fn get_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Get a u64 env var, or the default
pub fn get_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Get an f64 env var, or the default
pub fn get_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a comma separated list (`a,b,c`)
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
