//! AI Security Analytics - Batch Entry Point
//!
//! Usage: `ai-security-analytics [config.json]`
//! Without a config file, settings come from `ANALYTICS_*` environment variables.

use std::path::PathBuf;
use std::process::ExitCode;

use ai_security_analytics::constants::{APP_NAME, APP_VERSION};
use ai_security_analytics::logic::explore::describe;
use ai_security_analytics::{run, PipelineConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let mut config = match PipelineConfig::resolve(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    // The batch job always keeps its model
    config.output.persist = true;

    let outcome = match run(&config) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("{} ({}): {}", e.stage, e.error.kind(), e);
            return ExitCode::FAILURE;
        }
    };

    for summary in describe(&outcome.merged) {
        log::debug!(
            "{}: count {} mean {:.3} std {:.3} min {} max {}",
            summary.column,
            summary.count,
            summary.mean,
            summary.std,
            summary.min,
            summary.max
        );
    }

    match outcome.training.report.to_json() {
        Ok(json) => {
            log::info!("Evaluation report:\n{}", json);
            println!("{}", json);
        }
        Err(e) => log::warn!("Cannot serialize evaluation report: {}", e),
    }

    if let Some(path) = &outcome.artifact_path {
        log::info!("Model artifact: {}", path.display());
    }

    ExitCode::SUCCESS
}
