//! Cleaning & Imputation Stage
//!
//! 1. Drop fully duplicate rows, keeping the first occurrence.
//! 2. Forward-fill missing cells column by column, in row order.
//! 3. Drop rows that became identical through filling.
//!
//! Step 3 makes the stage idempotent: after it the table has no duplicates and
//! every remaining gap is a leading gap (no earlier value to copy), so a second
//! pass changes nothing. Leading gaps are left for the feature extractor to report.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::table::{Cell, Table};

/// What cleaning did to a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub duplicates_removed: usize,
    pub cells_filled: usize,
    /// Leading gaps with no earlier value to copy
    pub cells_still_missing: usize,
    pub rows_out: usize,
}

/// Clean a table, returning a new one
pub fn clean(table: &Table) -> Table {
    clean_with_report(table).0
}

pub fn clean_with_report(table: &Table) -> (Table, CleaningReport) {
    let (deduped, first_pass) = drop_duplicates(table);
    let (filled, cells_filled) = forward_fill(&deduped);
    let (cleaned, second_pass) = drop_duplicates(&filled);

    let report = CleaningReport {
        rows_in: table.n_rows(),
        duplicates_removed: first_pass + second_pass,
        cells_filled,
        cells_still_missing: cleaned.missing_count(),
        rows_out: cleaned.n_rows(),
    };

    log::info!(
        "Data cleaning complete: {} duplicates removed, {} cells filled, {} still missing. Final shape: {:?}",
        report.duplicates_removed,
        report.cells_filled,
        report.cells_still_missing,
        cleaned.shape()
    );

    (cleaned, report)
}

/// Keep the first occurrence of each distinct row. Returns (table, rows removed).
pub fn drop_duplicates(table: &Table) -> (Table, usize) {
    let mut seen: HashSet<&[Cell]> = HashSet::with_capacity(table.n_rows());
    let keep: Vec<usize> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| seen.insert(row.as_slice()))
        .map(|(i, _)| i)
        .collect();

    let removed = table.n_rows() - keep.len();
    (table.select_rows(&keep), removed)
}

/// Copy the last seen value of each column into later gaps. Returns (table, cells filled).
pub fn forward_fill(table: &Table) -> (Table, usize) {
    let mut last: Vec<Cell> = vec![None; table.n_cols()];
    let mut filled = 0;

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(c, cell)| match cell {
                    Some(_) => {
                        last[c] = cell.clone();
                        cell.clone()
                    }
                    None => {
                        if last[c].is_some() {
                            filled += 1;
                        }
                        last[c].clone()
                    }
                })
                .collect()
        })
        .collect();

    (
        Table::from_rows(table.name(), table.columns().to_vec(), rows),
        filled,
    )
}
