//! End-to-end pipeline orchestration.
//!
//! Stages run strictly in order: ingest, aggregate, forecast, insights,
//! report, output. Nothing is written until every earlier stage has
//! succeeded, and the execution log entry is appended last.

use crate::analysis::{aggregate, summarize, valid_records, AggregateOutcome};
use crate::config::Config;
use crate::error::{Result as PipelineResult, Stage, StageContext, StageError};
use crate::forecast::{forecast, ForecastEngine};
use crate::ingest::{read_transactions, ReadOptions, TransactionLog};
use crate::models::{ForecastPoint, InsightSummary, ReportArtifact, ReportMetadata};
use crate::output::{append_run_log, render_cleaned_csv, render_monthly_csv, write_all_atomic};
use crate::report::{compose, renderer_for};
use chrono::{Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Everything a successful run produced.
#[derive(Debug)]
pub struct RunResult {
    pub log: TransactionLog,
    pub aggregate: AggregateOutcome,
    pub forecast: Vec<ForecastPoint>,
    pub summary: InsightSummary,
    pub report: ReportArtifact,
    /// Report artifact as written to disk.
    pub rendered: String,
}

/// Spinner shown while a stage runs.
struct StageProgress {
    bar: Option<ProgressBar>,
}

impl StageProgress {
    fn new(show: bool) -> Self {
        if !show {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    fn start(&self, stage: Stage, message: &str) {
        debug!("{} stage started", stage);
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("{}: {}", stage, message));
        }
    }

    fn finish(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    fn abandon(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Run every stage and write the outputs.
pub fn run(
    config: &Config,
    engine: &mut dyn ForecastEngine,
    show_progress: bool,
) -> Result<RunResult, StageError> {
    let progress = StageProgress::new(show_progress);

    let outcome = analyze(config, engine, &progress).and_then(|result| {
        progress.start(Stage::Output, "writing outputs");
        persist(config, &result)?;
        Ok(result)
    });

    match outcome {
        Ok(result) => {
            progress.finish("Pipeline complete");
            Ok(result)
        }
        Err(e) => {
            progress.abandon();
            Err(e)
        }
    }
}

/// Run the computing stages without touching the filesystem outputs.
fn analyze(
    config: &Config,
    engine: &mut dyn ForecastEngine,
    progress: &StageProgress,
) -> Result<RunResult, StageError> {
    progress.start(Stage::Ingest, "reading transactions");
    let log = read_transactions(&config.input.path, &ReadOptions::from(&config.input))
        .stage(Stage::Ingest)?;

    progress.start(Stage::Aggregate, "building monthly totals");
    let aggregate = aggregate(&log.records).stage(Stage::Aggregate)?;

    progress.start(Stage::Forecast, "fitting forecast engine");
    let horizon = config.forecast.horizon;
    let points =
        forecast(engine, &aggregate.observations, horizon).stage(Stage::Forecast)?;

    progress.start(Stage::Insights, "deriving insights");
    let summary = summarize(&aggregate.observations, &points).stage(Stage::Insights)?;

    progress.start(Stage::Report, "composing report");
    let metadata = ReportMetadata {
        input_path: config.input.path.display().to_string(),
        generated_at: Utc::now(),
        engine: engine.name().to_string(),
        horizon,
        rows_kept: aggregate.kept_rows,
        rows_dropped: aggregate.dropped_rows,
    };
    let report = compose(&aggregate.observations, &points, &summary, &*engine, metadata)
        .stage(Stage::Report)?;
    let rendered = renderer_for(config.report.format, config.report.chart_width)
        .render(&report)
        .stage(Stage::Report)?;

    Ok(RunResult {
        log,
        aggregate,
        forecast: points,
        summary,
        report,
        rendered,
    })
}

/// Write the derived tables and report, then append the log entry.
///
/// All three files are staged before any of them replaces an earlier run's
/// output.
fn persist(config: &Config, result: &RunResult) -> Result<(), StageError> {
    write_outputs(config, result).stage(Stage::Output)
}

fn write_outputs(config: &Config, result: &RunResult) -> PipelineResult<()> {
    let output = &config.output;

    let cleaned = render_cleaned_csv(&result.log.headers, &valid_records(&result.log.records))?;
    let monthly = render_monthly_csv(&result.aggregate.observations)?;

    write_all_atomic(&[
        (output.cleaned_csv.as_path(), cleaned.as_slice()),
        (output.monthly_csv.as_path(), monthly.as_slice()),
        (output.report.as_path(), result.rendered.as_bytes()),
    ])?;

    append_run_log(&output.log, &Local::now())?;

    info!("Outputs written, report at {}", output.report.display());
    Ok(())
}
