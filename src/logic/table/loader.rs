//! CSV loading for flow, ground truth and descriptor files

use std::fs::File;
use std::path::Path;

use crate::logic::error::{PipelineError, PipelineResult, SchemaError};
use crate::logic::schema::FeatureSchema;

use super::{parse_cell, unique_names, Cell, Table};

/// Load a file whose first record is the header
pub fn load_headered(path: &Path, name: &str) -> PipelineResult<Table> {
    let mut records = read_records(path)?.into_iter();

    let header = match records.next() {
        Some(fields) => fields,
        None => {
            log::warn!("{} is empty", path.display());
            return Ok(Table::new(name, Vec::new()));
        }
    };

    let columns = unique_names(
        header
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let field = if i == 0 { field.trim_start_matches('\u{feff}') } else { field };
                field.trim().to_string()
            })
            .collect(),
    );

    let expected = columns.len();
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (i, fields) in records.enumerate() {
        // header is record 1
        check_width(i + 2, &fields, expected)?;
        rows.push(fields.iter().map(|f| parse_cell(f)).collect());
    }

    let table = Table::from_rows(name, columns, rows);
    log::info!("Loaded {} from {}: shape {:?}", name, path.display(), table.shape());
    Ok(table)
}

/// Load a header-less file, naming columns from the resolved schema
pub fn load_headerless(path: &Path, name: &str, schema: &FeatureSchema) -> PipelineResult<Table> {
    let columns = schema.names();
    let expected = columns.len();
    let mut rows = Vec::new();

    for (i, fields) in read_records(path)?.into_iter().enumerate() {
        check_width(i + 1, &fields, expected)?;
        rows.push(fields.iter().map(|f| parse_cell(f)).collect());
    }

    let table = Table::from_rows(name, columns, rows);
    log::info!("Loaded {} from {}: shape {:?}", name, path.display(), table.shape());
    Ok(table)
}

/// Short records are padded later; longer ones would lose data
fn check_width(record: usize, fields: &[String], expected: usize) -> Result<(), SchemaError> {
    if fields.len() > expected {
        return Err(SchemaError::RowTooWide {
            row: record,
            width: fields.len(),
            expected,
        });
    }
    Ok(())
}

/// Read every record as raw fields
fn read_records(path: &Path) -> PipelineResult<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        out.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(out)
}

fn csv_error(path: &Path, err: csv::Error) -> PipelineError {
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => PipelineError::io(path, source),
        _ => SchemaError::Unreadable {
            path: path.display().to_string(),
            reason,
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_headered_marks_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gt.csv");
        fs::write(&path, "Source Port,label\n80,benign\n,attack\nNaN,\n").unwrap();

        let t = load_headered(&path, "ground truth").unwrap();
        assert_eq!(t.columns(), &["Source Port".to_string(), "label".to_string()]);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.cell(0, 0), Some("80"));
        assert_eq!(t.cell(1, 0), None);
        assert_eq!(t.cell(2, 0), None);
        assert_eq!(t.cell(2, 1), None);
    }

    #[test]
    fn test_load_headered_dedups_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        fs::write(&path, "\u{feff}a,a,b\n1,2,3\n").unwrap();

        let t = load_headered(&path, "t").unwrap();
        assert_eq!(t.columns(), &["a".to_string(), "a.1".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_headered_rejects_wide_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gt.csv");
        fs::write(&path, "K,label\n1,benign\n2,benign,EXTRA\n").unwrap();

        let err = load_headered(&path, "ground truth").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::RowTooWide { row: 3, width: 3, expected: 2 })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_headered(&dir.path().join("nope.csv"), "flow").unwrap_err();
        assert_eq!(err.kind(), "IOError");
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_invalid_utf8_is_schema_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        fs::write(&path, b"Name,Description\ncaf\xe9,x\n").unwrap();

        let err = load_headered(&path, "descriptor").unwrap_err();
        assert!(matches!(err, PipelineError::Schema(SchemaError::Unreadable { .. })));
    }

    #[test]
    fn test_headerless_uses_schema_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flow.csv");
        fs::write(&path, "1.1.1.1,80\n2.2.2.2\n").unwrap();

        let schema = FeatureSchema::from_names(&["srcip", "sport"]);
        let t = load_headerless(&path, "flow", &schema).unwrap();
        assert_eq!(t.columns(), &["srcip".to_string(), "sport".to_string()]);
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.cell(1, 1), None);
    }

    #[test]
    fn test_headerless_rejects_wide_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flow.csv");
        fs::write(&path, "a,b\na,b,c\n").unwrap();

        let schema = FeatureSchema::from_names(&["x", "y"]);
        let err = load_headerless(&path, "flow", &schema).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::RowTooWide { row: 2, width: 3, expected: 2 })
        ));
    }
}
