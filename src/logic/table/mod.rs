//! Table Module - In-memory tabular data
//!
//! Value-like tables passed between pipeline stages. Every stage takes a
//! `&Table` and produces a new one; nothing is mutated after hand-off.

pub mod loader;
pub mod split;

use serde::{Deserialize, Serialize};

use super::error::SchemaError;

pub use loader::{load_headered, load_headerless};
pub use split::train_test_split;

/// A single cell: `None` marks a missing value
pub type Cell = Option<String>;

/// Text tokens treated as missing when loading
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

/// Convert a raw field to a cell
pub fn parse_cell(raw: &str) -> Cell {
    if MISSING_MARKERS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Make column names unique: repeats get `.1`, `.2`, ... suffixes
pub fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", name, n);
            n += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Logical name ("flow", "ground truth", ...) used in error messages
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Empty table with the given columns
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build from rows; short rows are padded with missing cells.
    /// The loaders reject rows wider than `columns` before they get here.
    pub fn from_rows(name: &str, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same data under another logical name
    pub fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Index of a required column, or a SchemaError naming it
    pub fn require_column(&self, column: &str) -> Result<usize, SchemaError> {
        self.column_index(column)
            .ok_or_else(|| SchemaError::missing(&self.name, column))
    }

    /// Cell values of one column, in row order
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Self {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Number of missing cells across the table
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|c| c.is_none()).count())
            .sum()
    }
}

/// Build a table from literals (tests only)
#[cfg(test)]
pub(crate) fn fixture(name: &str, columns: &[&str], rows: &[&[Option<&str>]]) -> Table {
    Table::from_rows(
        name,
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|c| c.map(|s| s.to_string())).collect())
            .collect(),
    )
}
