//! Pipeline Orchestrator
//!
//! Schema Resolver -> Record Linkage -> Cleaning -> Feature Extraction ->
//! Training & Evaluation, strictly in sequence. Each stage gets the complete
//! output of the previous one; any failure stops the run and is reported with
//! the stage that raised it.


use std::path::PathBuf;

use serde::Serialize;

use crate::logic::cleaning::{clean, clean_with_report, CleaningReport};
use crate::logic::config::PipelineConfig;
use crate::logic::error::{PipelineResult, RunError, Stage, StageContext};
use crate::logic::explore::selector_options;
use crate::logic::features::{extract, FeatureSpec};
use crate::logic::guard::{default_model_dir, parse_key, persist_artifact};
use crate::logic::linkage::inner_join;
use crate::logic::model::{TrainingEngine, TrainingOutcome};
use crate::logic::schema::{resolve_file, FeatureSchema};
use crate::logic::table::{load_headered, load_headerless, train_test_split, Table};

/// Row accounting for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub flow_rows: usize,
    pub ground_truth_rows: usize,
    pub merged_rows: usize,
    pub cleaning: CleaningReport,
    /// Rows dropped before training because a feature or the label was still missing
    pub incomplete_rows_dropped: usize,
    pub training_rows: usize,
    pub holdout_rows: usize,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub schema: Option<FeatureSchema>,
    /// Cleaned merged table (dashboard input)
    pub merged: Table,
    /// Distinct values of the dashboard selector column
    pub selector_values: Vec<String>,
    pub summary: RunSummary,
    pub training: TrainingOutcome,
    pub artifact_path: Option<PathBuf>,
}

/// Run the full batch pipeline
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome, RunError> {
    let sources = &config.sources;
    let mut summary = RunSummary::default();

    // Schema resolution
    let schema = match &sources.schema_path {
        Some(path) => Some(resolve_file(path).stage(Stage::SchemaResolution)?),
        None => None,
    };

    // Loading
    let flow = match &schema {
        Some(schema) => load_headerless(&sources.flow_path, "flow", schema),
        None => load_headered(&sources.flow_path, "flow"),
    }
    .stage(Stage::Loading)?;
    let truth = load_headered(&sources.ground_truth_path, "ground truth").stage(Stage::Loading)?;
    summary.flow_rows = flow.n_rows();
    summary.ground_truth_rows = truth.n_rows();

    // Record linkage
    let merged = inner_join(&flow, &truth, &config.join_keys).stage(Stage::Linkage)?;
    summary.merged_rows = merged.n_rows();

    // Cleaning
    let (cleaned, cleaning) = clean_with_report(&merged);
    summary.cleaning = cleaning;

    // Feature extraction: validate columns, then drop rows with unresolved gaps
    let (usable, dropped) = complete_rows(&cleaned, &config.features).stage(Stage::Extraction)?;
    summary.incomplete_rows_dropped = dropped;

    // Training & evaluation
    let (train, holdout) = match (&sources.holdout_path, config.holdout_fraction) {
        (Some(path), _) => {
            let raw = load_headered(path, "hold-out").stage(Stage::Loading)?;
            let (holdout, _) = complete_rows(&clean(&raw), &config.features).stage(Stage::Extraction)?;
            (usable.renamed("training"), Some(holdout))
        }
        (None, Some(fraction)) if fraction > 0.0 => {
            let (train, holdout) =
                train_test_split(&usable, fraction, config.training.seed).stage(Stage::Training)?;
            (train, Some(holdout))
        }
        _ => (usable.renamed("training"), None),
    };
    summary.training_rows = train.n_rows();
    summary.holdout_rows = holdout.as_ref().map_or(0, Table::n_rows);

    let engine = TrainingEngine::new(config.training.clone());
    let training = engine
        .train_from_tables(&train, &config.features, holdout.as_ref())
        .stage(Stage::Training)?;

    // Persistence
    let artifact_path = if config.output.persist {
        let key = config
            .output
            .key_hex
            .as_deref()
            .map(parse_key)
            .transpose()
            .stage(Stage::Persistence)?;
        let dir = config.output.artifact_dir.clone().unwrap_or_else(default_model_dir);
        Some(persist_artifact(&training.artifact, &dir, key.as_deref()).stage(Stage::Persistence)?)
    } else {
        None
    };

    let selector_values = match selector_options(&cleaned, &config.view) {
        Ok(values) => values,
        Err(e) => {
            log::warn!("Dashboard selector unavailable: {}", e);
            Vec::new()
        }
    };

    log::info!(
        "Pipeline complete: {} merged rows, {} training rows, {} hold-out rows",
        summary.merged_rows,
        summary.training_rows,
        summary.holdout_rows
    );

    Ok(PipelineOutcome {
        schema,
        merged: cleaned,
        selector_values,
        summary,
        training,
        artifact_path,
    })
}

/// Rows of `table` with every feature and the label present, plus the drop count
fn complete_rows(table: &Table, features: &FeatureSpec) -> PipelineResult<(Table, usize)> {
    let frame = extract(table, features)?;
    let complete = frame.complete_row_indices();
    let dropped = frame.n_rows() - complete.len();
    if dropped > 0 {
        log::warn!(
            "{}: dropped {} rows with missing feature or label values",
            table.name(),
            dropped
        );
    }
    Ok((table.select_rows(&complete), dropped))
}
