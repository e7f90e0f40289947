//! Feature / target extraction from the cleaned merged table

use serde::{Deserialize, Serialize};

use crate::logic::error::{ModelingError, SchemaError};
use crate::logic::table::{Cell, Table};

/// Which columns feed the model, and which one is the label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub features: Vec<String>,
    pub target: String,
}

impl FeatureSpec {
    pub fn new<S: AsRef<str>>(features: &[S], target: &str) -> Self {
        Self {
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            target: target.to_string(),
        }
    }
}

/// A cell that reached extraction still missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub row: usize,
    pub column: String,
}

/// Raw feature cells plus aligned labels, feature columns in configured order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    target: String,
    cells: Vec<Vec<Cell>>,
    labels: Vec<Cell>,
}

impl FeatureFrame {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn labels(&self) -> &[Cell] {
        &self.labels
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Every missing feature or label cell, row-major
    pub fn gaps(&self) -> Vec<Gap> {
        let mut gaps = Vec::new();
        for (row, (cells, label)) in self.cells.iter().zip(&self.labels).enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                if cell.is_none() {
                    gaps.push(Gap {
                        row,
                        column: self.columns[c].clone(),
                    });
                }
            }
            if label.is_none() {
                gaps.push(Gap {
                    row,
                    column: self.target.clone(),
                });
            }
        }
        gaps
    }

    fn row_complete(&self, row: usize) -> bool {
        self.labels[row].is_some() && self.cells[row].iter().all(Option::is_some)
    }

    /// Indices of rows without gaps
    pub fn complete_row_indices(&self) -> Vec<usize> {
        (0..self.n_rows()).filter(|&r| self.row_complete(r)).collect()
    }

    /// Rows without gaps. Returns (frame, rows dropped).
    pub fn complete_rows(&self) -> (FeatureFrame, usize) {
        let keep = self.complete_row_indices();
        let dropped = self.n_rows() - keep.len();
        (self.select(&keep), dropped)
    }

    pub fn select(&self, rows: &[usize]) -> FeatureFrame {
        FeatureFrame {
            columns: self.columns.clone(),
            target: self.target.clone(),
            cells: rows.iter().map(|&r| self.cells[r].clone()).collect(),
            labels: rows.iter().map(|&r| self.labels[r].clone()).collect(),
        }
    }

    /// Label vector; the first missing label is an error
    pub fn label_vector(&self) -> Result<Vec<String>, ModelingError> {
        self.labels
            .iter()
            .enumerate()
            .map(|(row, label)| {
                label.clone().ok_or_else(|| ModelingError::IncompleteFeatures {
                    row,
                    column: self.target.clone(),
                })
            })
            .collect()
    }
}

/// Validate required columns and split the table into features and labels.
///
/// Fails on the first missing column, features checked in configured order
/// before the target. Missing cells are carried through untouched.
pub fn extract(table: &Table, spec: &FeatureSpec) -> Result<FeatureFrame, SchemaError> {
    let feature_idx: Vec<usize> = spec
        .features
        .iter()
        .map(|f| table.require_column(f))
        .collect::<Result<_, _>>()?;
    let target_idx = table.require_column(&spec.target)?;

    let cells = table
        .rows()
        .iter()
        .map(|row| feature_idx.iter().map(|&c| row[c].clone()).collect())
        .collect();
    let labels = table.column(target_idx).cloned().collect();

    Ok(FeatureFrame {
        columns: spec.features.clone(),
        target: spec.target.clone(),
        cells,
        labels,
    })
}
