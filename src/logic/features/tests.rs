use super::{extract, ColumnEncoding, FeatureEncoder, FeatureSpec, Gap};
use crate::logic::error::{ModelingError, SchemaError};
use crate::logic::table::fixture;

fn merged() -> crate::logic::table::Table {
    fixture(
        "merged",
        &["proto", "sbytes", "dur", "label"],
        &[
            &[Some("tcp"), Some("100"), Some("0.5"), Some("benign")],
            &[Some("udp"), Some("200"), None, Some("attack")],
            &[Some("tcp"), Some("300"), Some("1.5"), None],
        ],
    )
}

#[test]
fn test_extract_preserves_configured_order() {
    let spec = FeatureSpec::new(&["dur", "proto"], "label");
    let frame = extract(&merged(), &spec).unwrap();

    assert_eq!(frame.columns(), &["dur", "proto"]);
    assert_eq!(frame.n_rows(), 3);
    assert_eq!(frame.cells()[0][0].as_deref(), Some("0.5"));
    assert_eq!(frame.cells()[0][1].as_deref(), Some("tcp"));
    assert_eq!(frame.labels()[1].as_deref(), Some("attack"));
}

#[test]
fn test_first_missing_column_named() {
    let spec = FeatureSpec::new(&["dur", "spkts", "dpkts"], "label");
    assert_eq!(
        extract(&merged(), &spec),
        Err(SchemaError::missing("merged", "spkts"))
    );

    let spec = FeatureSpec::new(&["dur"], "Attack category");
    assert_eq!(
        extract(&merged(), &spec),
        Err(SchemaError::missing("merged", "Attack category"))
    );
}

#[test]
fn test_gaps_are_reported_not_imputed() {
    let spec = FeatureSpec::new(&["dur"], "label");
    let frame = extract(&merged(), &spec).unwrap();

    assert_eq!(
        frame.gaps(),
        vec![
            Gap { row: 1, column: "dur".to_string() },
            Gap { row: 2, column: "label".to_string() },
        ]
    );
    assert!(matches!(
        frame.label_vector(),
        Err(ModelingError::IncompleteFeatures { row: 2, .. })
    ));

    let (complete, dropped) = frame.complete_rows();
    assert_eq!(dropped, 2);
    assert_eq!(complete.n_rows(), 1);
    assert!(complete.gaps().is_empty());
}

#[test]
fn test_encoder_detects_categorical_columns() {
    let spec = FeatureSpec::new(&["proto", "sbytes"], "label");
    let frame = extract(&merged(), &spec).unwrap();
    let encoder = FeatureEncoder::fit(&frame);

    assert_eq!(
        encoder.encodings()[0],
        ColumnEncoding::Categorical { categories: vec!["tcp".to_string(), "udp".to_string()] }
    );
    assert_eq!(encoder.encodings()[1], ColumnEncoding::Numeric);

    let matrix = encoder.encode(&frame).unwrap();
    assert_eq!(matrix.values()[[0, 0]], 0.0);
    assert_eq!(matrix.values()[[1, 0]], 1.0);
    assert_eq!(matrix.values()[[2, 1]], 300.0);
    assert!(matrix.ensure_complete().is_ok());
}

#[test]
fn test_unseen_category_gets_reserved_code() {
    let spec = FeatureSpec::new(&["proto"], "label");
    let encoder = FeatureEncoder::fit(&extract(&merged(), &spec).unwrap());

    let other = fixture(
        "hold-out",
        &["proto", "label"],
        &[&[Some("icmp"), Some("benign")], &[Some("udp"), Some("attack")]],
    );
    let matrix = encoder.encode(&extract(&other, &spec).unwrap()).unwrap();
    assert_eq!(matrix.values()[[0, 0]], 2.0);
    assert_eq!(matrix.values()[[1, 0]], 1.0);
    assert!(matrix.ensure_complete().is_ok());
}

#[test]
fn test_missing_cell_stays_gap() {
    let spec = FeatureSpec::new(&["proto", "sbytes"], "label");
    let encoder = FeatureEncoder::fit(&extract(&merged(), &spec).unwrap());

    let other = fixture(
        "hold-out",
        &["proto", "sbytes", "label"],
        &[&[Some("tcp"), None, Some("benign")]],
    );
    let matrix = encoder.encode(&extract(&other, &spec).unwrap()).unwrap();
    assert_eq!(matrix.first_gap(), Some((0, "sbytes")));
    assert!(matches!(
        matrix.ensure_complete(),
        Err(ModelingError::IncompleteFeatures { row: 0, .. })
    ));
}

#[test]
fn test_encoder_rejects_other_layout() {
    let encoder = FeatureEncoder::fit(&extract(&merged(), &FeatureSpec::new(&["dur", "sbytes"], "label")).unwrap());
    let swapped = extract(&merged(), &FeatureSpec::new(&["sbytes", "dur"], "label")).unwrap();

    assert!(matches!(
        encoder.encode(&swapped),
        Err(ModelingError::LayoutMismatch { .. })
    ));
}
