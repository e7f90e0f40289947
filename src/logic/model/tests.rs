use super::{TrainingConfig, TrainingEngine};
use crate::logic::error::{ModelingError, PipelineError, SchemaError};
use crate::logic::features::FeatureSpec;
use crate::logic::table::{fixture, Table};

fn small_config() -> TrainingConfig {
    TrainingConfig {
        n_estimators: 10,
        cv_folds: 3,
        workers: 2,
        ..TrainingConfig::default()
    }
}

/// Two well separated classes on (sbytes, proto)
fn traffic(name: &str, rows: usize) -> Table {
    let data: Vec<[String; 3]> = (0..rows)
        .map(|i| {
            if i % 2 == 0 {
                [format!("{}", 100 + i), "tcp".to_string(), "Normal".to_string()]
            } else {
                [format!("{}", 90_000 + i), "udp".to_string(), "Exploits".to_string()]
            }
        })
        .collect();
    let cells: Vec<Vec<Option<&str>>> = data
        .iter()
        .map(|r| r.iter().map(|c| Some(c.as_str())).collect())
        .collect();
    let refs: Vec<&[Option<&str>]> = cells.iter().map(|r| r.as_slice()).collect();
    fixture(name, &["sbytes", "proto", "Attack category"], &refs)
}

fn spec() -> FeatureSpec {
    FeatureSpec::new(&["sbytes", "proto"], "Attack category")
}

#[test]
fn test_missing_feature_column_yields_no_artifact() {
    let engine = TrainingEngine::new(small_config());
    let spec = FeatureSpec::new(&["sbytes", "dur"], "Attack category");

    let result = engine.train_from_tables(&traffic("training", 20), &spec, None);
    match result {
        Err(PipelineError::Schema(err)) => {
            assert_eq!(err, SchemaError::missing("training", "dur"));
        }
        other => panic!("expected schema error, got {:?}", other.map(|o| o.report)),
    }
}

#[test]
fn test_single_class_is_modeling_error() {
    let table = fixture(
        "training",
        &["sbytes", "proto", "Attack category"],
        &[
            &[Some("1"), Some("tcp"), Some("Normal")],
            &[Some("2"), Some("udp"), Some("Normal")],
            &[Some("3"), Some("tcp"), Some("Normal")],
        ],
    );
    let engine = TrainingEngine::new(small_config());

    match engine.train_from_tables(&table, &spec(), None) {
        Err(PipelineError::Modeling(ModelingError::SingleClass { class })) => assert_eq!(class, "Normal"),
        other => panic!("expected single-class error, got {:?}", other.map(|o| o.report)),
    }
}

#[test]
fn test_training_without_holdout_leaves_fields_unset() {
    let engine = TrainingEngine::new(small_config());
    let outcome = engine.train_from_tables(&traffic("training", 30), &spec(), None).unwrap();

    assert!(outcome.report.holdout.is_none());
    assert_eq!(outcome.report.holdout_accuracy(), None);
    assert_eq!(outcome.report.training_rows, 30);
    assert_eq!(outcome.report.cross_validation.folds, 3);
    assert_eq!(outcome.artifact.classes, vec!["Exploits", "Normal"]);

    let json = outcome.report.to_json().unwrap();
    assert!(json.contains("\"holdout\": null"));
}

#[test]
fn test_holdout_confusion_sums_to_holdout_size() {
    let engine = TrainingEngine::new(small_config());
    let holdout = traffic("hold-out", 9);
    let outcome = engine
        .train_from_tables(&traffic("training", 40), &spec(), Some(&holdout))
        .unwrap();

    let eval = outcome.report.holdout.unwrap();
    assert_eq!(eval.confusion_matrix.total(), 9);
    assert_eq!(eval.rows, 9);
    assert_eq!(eval.accuracy, 1.0);
}

#[test]
fn test_unseen_holdout_category_still_scored() {
    let engine = TrainingEngine::new(small_config());
    let holdout = fixture(
        "hold-out",
        &["sbytes", "proto", "Attack category"],
        &[
            &[Some("102"), Some("tcp"), Some("Normal")],
            &[Some("90003"), Some("udp"), Some("Exploits")],
            &[Some("150"), Some("icmp"), Some("Normal")],
        ],
    );
    let outcome = engine
        .train_from_tables(&traffic("training", 40), &spec(), Some(&holdout))
        .unwrap();

    let eval = outcome.report.holdout.unwrap();
    assert_eq!(eval.rows, 3);
    assert_eq!(eval.confusion_matrix.total(), 3);
}

#[test]
fn test_missing_holdout_value_fails_evaluation() {
    let engine = TrainingEngine::new(small_config());
    let holdout = fixture(
        "hold-out",
        &["sbytes", "proto", "Attack category"],
        &[
            &[Some("102"), Some("tcp"), Some("Normal")],
            &[None, Some("udp"), Some("Exploits")],
        ],
    );

    let err = engine
        .train_from_tables(&traffic("training", 40), &spec(), Some(&holdout))
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Modeling(ModelingError::IncompleteFeatures { row: 1, .. })
    ));
}

#[test]
fn test_cv_mean_matches_fold_scores() {
    let engine = TrainingEngine::new(small_config());
    let outcome = engine.train_from_tables(&traffic("training", 31), &spec(), None).unwrap();

    let cv = &outcome.report.cross_validation;
    let mean = cv.fold_scores.iter().sum::<f64>() / cv.fold_scores.len() as f64;
    assert_eq!(cv.fold_scores.len(), 3);
    assert!((cv.mean - mean).abs() < 1e-12);
}

#[test]
fn test_same_seed_same_model() {
    let engine = TrainingEngine::new(small_config());
    let a = engine.train_from_tables(&traffic("training", 24), &spec(), None).unwrap();
    let b = engine.train_from_tables(&traffic("training", 24), &spec(), None).unwrap();

    assert_eq!(a.artifact.forest(), b.artifact.forest());
    assert_eq!(a.report.cross_validation, b.report.cross_validation);
}

#[test]
fn test_too_few_rows_for_folds() {
    let engine = TrainingEngine::new(TrainingConfig {
        cv_folds: 5,
        ..small_config()
    });

    let err = engine.train_from_tables(&traffic("training", 4), &spec(), None).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Modeling(ModelingError::InvalidFolds { folds: 5, samples: 4 })
    ));
}

#[test]
fn test_expired_deadline_aborts_cross_validation() {
    let engine = TrainingEngine::new(TrainingConfig {
        cv_deadline_secs: Some(0),
        ..small_config()
    });

    let err = engine.train_from_tables(&traffic("training", 20), &spec(), None).unwrap_err();
    assert_eq!(err.kind(), "TimeoutError");
}

#[test]
fn test_invalid_config_rejected() {
    let engine = TrainingEngine::new(TrainingConfig {
        cv_folds: 1,
        ..small_config()
    });
    let err = engine.train_from_tables(&traffic("training", 20), &spec(), None).unwrap_err();
    assert!(matches!(err, PipelineError::Modeling(ModelingError::InvalidConfig(_))));
}
