use std::path::Path;

use crate::logic::error::{PipelineResult, SchemaError};
use crate::logic::table::{load_headered, unique_names, Table};

use super::{FeatureSchema, SchemaEntry};

pub const NAME_COLUMN: &str = "Name";
pub const TYPE_COLUMN: &str = "Type";
pub const DESCRIPTION_COLUMN: &str = "Description";

/// Load and resolve a descriptor file
pub fn resolve_file(path: &Path) -> PipelineResult<FeatureSchema> {
    let descriptor = load_headered(path, "schema descriptor")?;
    let schema = resolve(&descriptor)?;
    log::info!("Resolved {} feature names from {}", schema.len(), path.display());
    Ok(schema)
}

/// Resolve a descriptor table into an ordered schema.
///
/// One entry per descriptor row, in row order. Extra descriptor columns are ignored.
pub fn resolve(descriptor: &Table) -> Result<FeatureSchema, SchemaError> {
    let name_idx = find_column(descriptor, NAME_COLUMN).ok_or(SchemaError::MissingNameColumn)?;
    let type_idx = find_column(descriptor, TYPE_COLUMN);
    let desc_idx = find_column(descriptor, DESCRIPTION_COLUMN);

    let mut names = Vec::with_capacity(descriptor.n_rows());
    for row in 0..descriptor.n_rows() {
        let name = descriptor
            .cell(row, name_idx)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(SchemaError::EmptyName { row: row + 1 })?;
        names.push(name.to_string());
    }

    let entries = unique_names(names)
        .into_iter()
        .enumerate()
        .map(|(row, name)| SchemaEntry {
            position: row + 1,
            name,
            type_hint: optional_text(descriptor, row, type_idx),
            description: optional_text(descriptor, row, desc_idx),
        })
        .collect();

    Ok(FeatureSchema::from_entries(entries))
}

/// Exact match first, then case-insensitive
fn find_column(table: &Table, column: &str) -> Option<usize> {
    table.column_index(column).or_else(|| {
        table
            .columns()
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    })
}

fn optional_text(table: &Table, row: usize, column: Option<usize>) -> Option<String> {
    column
        .and_then(|c| table.cell(row, c))
        .map(|s| s.trim().to_string())
}
