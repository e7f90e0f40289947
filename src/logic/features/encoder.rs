//! Feature Encoder - raw cells to a numeric matrix
//!
//! Numeric columns are parsed as `f64`. Columns holding any non-numeric value
//! (protocol, service, state, ...) are categorical and encoded as the index of
//! the value in the sorted distinct training values; a value never seen in
//! training gets the reserved code `categories.len()`. Gaps and unparsable
//! numbers become `NaN`; the trainer and evaluator reject them.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::logic::error::ModelingError;
use crate::logic::schema::layout_hash;

use super::extract::FeatureFrame;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnEncoding {
    Numeric,
    Categorical { categories: Vec<String> },
}

impl ColumnEncoding {
    fn encode(&self, cell: Option<&str>) -> f64 {
        let Some(raw) = cell else {
            return f64::NAN;
        };
        match self {
            ColumnEncoding::Numeric => parse_number(raw).unwrap_or(f64::NAN),
            ColumnEncoding::Categorical { categories } => categories
                .binary_search_by(|c| c.as_str().cmp(raw))
                .unwrap_or(categories.len()) as f64,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Per-column encodings fitted on training data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<String>,
    encodings: Vec<ColumnEncoding>,
}

impl FeatureEncoder {
    pub fn fit(frame: &FeatureFrame) -> Self {
        let encodings = (0..frame.columns().len())
            .map(|c| {
                let values: Vec<&str> = frame
                    .cells()
                    .iter()
                    .filter_map(|row| row[c].as_deref())
                    .collect();

                if values.iter().all(|v| parse_number(v).is_some()) {
                    ColumnEncoding::Numeric
                } else {
                    let mut categories: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    categories.sort();
                    categories.dedup();
                    ColumnEncoding::Categorical { categories }
                }
            })
            .collect();

        Self {
            columns: frame.columns().to_vec(),
            encodings,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn encodings(&self) -> &[ColumnEncoding] {
        &self.encodings
    }

    pub fn layout_hash(&self) -> u32 {
        layout_hash(&self.columns)
    }

    /// Encode a frame built with the same column layout
    pub fn encode(&self, frame: &FeatureFrame) -> Result<FeatureMatrix, ModelingError> {
        let actual = layout_hash(frame.columns());
        if actual != self.layout_hash() {
            return Err(ModelingError::LayoutMismatch {
                expected: self.layout_hash(),
                actual,
            });
        }

        let values = Array2::from_shape_fn((frame.n_rows(), self.columns.len()), |(r, c)| {
            self.encodings[c].encode(frame.cells()[r][c].as_deref())
        });

        Ok(FeatureMatrix {
            columns: self.columns.clone(),
            values,
        })
    }
}

/// Numeric feature matrix bound to its column layout
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Build from raw values (rows x columns)
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.ncols());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn layout_hash(&self) -> u32 {
        layout_hash(&self.columns)
    }

    /// First cell that is not a usable number, row-major
    pub fn first_gap(&self) -> Option<(usize, &str)> {
        self.values
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|((r, c), _)| (r, self.columns[c].as_str()))
    }

    /// Reject matrices with gaps
    pub fn ensure_complete(&self) -> Result<(), ModelingError> {
        match self.first_gap() {
            Some((row, column)) => Err(ModelingError::IncompleteFeatures {
                row,
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }
}
