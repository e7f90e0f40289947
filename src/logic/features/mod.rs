//! Features Module - Feature/Target Extractor
//!
//! Validates that the cleaned merged table carries every configured column,
//! splits it into feature cells and an aligned label vector, and encodes the
//! cells into a numeric matrix bound to its column layout.

pub mod encoder;
pub mod extract;

#[cfg(test)]
mod tests;

pub use encoder::{ColumnEncoding, FeatureEncoder, FeatureMatrix};
pub use extract::{extract, FeatureFrame, FeatureSpec, Gap};
