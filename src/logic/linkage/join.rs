//! Inner equi-join on a canonicalized composite key

use std::collections::HashMap;

use crate::logic::error::PipelineResult;
use crate::logic::table::{unique_names, Cell, Table};

use super::key::{canonicalize, CompositeKey};

/// Inner-join `flow` with `truth` on `key`.
///
/// - Every key column is checked on both sides before any row is touched.
/// - Key cells are canonicalized (see [`canonicalize`]); a missing key cell never matches.
/// - Output order: flow row order, then ground truth row order within a flow row.
/// - Duplicate keys are not collapsed: `m` flow rows and `n` ground truth rows
///   sharing a key yield `m * n` merged rows.
/// - Columns: all flow columns, then ground truth columns. A key pair with the
///   same name on both sides is emitted once; other shared names get `_x` / `_y`.
///   A suffixed name that collides with an existing column gets a `.N` suffix.
pub fn inner_join(flow: &Table, truth: &Table, key: &CompositeKey) -> PipelineResult<Table> {
    key.validate()?;

    let mut flow_key = Vec::with_capacity(key.len());
    let mut truth_key = Vec::with_capacity(key.len());
    for pair in key.pairs() {
        flow_key.push(flow.require_column(&pair.flow)?);
        truth_key.push(truth.require_column(&pair.truth)?);
    }

    let (columns, truth_keep) = merged_columns(flow, truth, key);

    // Index ground truth rows by canonical key, preserving row order per key
    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (i, row) in truth.rows().iter().enumerate() {
        if let Some(k) = key_of(row, &truth_key) {
            index.entry(k).or_default().push(i);
        }
    }

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for row in flow.rows() {
        let Some(k) = key_of(row, &flow_key) else {
            continue;
        };
        let Some(matches) = index.get(&k) else {
            continue;
        };
        for &t in matches {
            let truth_row = &truth.rows()[t];
            let mut merged = row.clone();
            merged.extend(truth_keep.iter().map(|&c| truth_row[c].clone()));
            rows.push(merged);
        }
    }

    let merged = Table::from_rows("merged", columns, rows);
    log::info!("Merged dataset shape: {:?}", merged.shape());
    Ok(merged)
}

/// Canonical key tuple of a row, `None` when any key cell is missing
fn key_of(row: &[Cell], columns: &[usize]) -> Option<Vec<String>> {
    columns
        .iter()
        .map(|&c| row[c].as_deref().map(canonicalize))
        .collect()
}

/// Output column names and the ground truth columns to copy
fn merged_columns(flow: &Table, truth: &Table, key: &CompositeKey) -> (Vec<String>, Vec<usize>) {
    let shared_keys: Vec<&str> = key
        .pairs()
        .iter()
        .filter(|p| p.flow == p.truth)
        .map(|p| p.truth.as_str())
        .collect();

    let truth_keep: Vec<usize> = truth
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !shared_keys.contains(&name.as_str()))
        .map(|(i, _)| i)
        .collect();

    let truth_names: Vec<&String> = truth_keep.iter().map(|&i| &truth.columns()[i]).collect();

    let mut columns: Vec<String> = flow
        .columns()
        .iter()
        .map(|name| {
            if truth_names.contains(&name) {
                format!("{}_x", name)
            } else {
                name.clone()
            }
        })
        .collect();

    columns.extend(truth_names.iter().map(|name| {
        if flow.has_column(name) {
            format!("{}_y", name)
        } else {
            (*name).clone()
        }
    }));

    (unique_names(columns), truth_keep)
}
