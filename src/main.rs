//! Sales Forecaster - monthly sales forecasting from a raw transaction log
//!
//! A CLI tool that cleans a sales CSV, aggregates it into monthly totals,
//! forecasts the coming months with a confidence band and writes a
//! five-page report with a narrative summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, unreadable config, or a failed pipeline stage

mod analysis;
mod cli;
mod config;
mod error;
mod forecast;
mod ingest;
mod models;
mod output;
mod pipeline;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use forecast::{EngineConfig, TrendSeasonalEngine};
use models::{format_currency, TrendDirection};
use pipeline::RunResult;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Sales Forecaster v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_forecast(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("\n❌ {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sales-forecaster.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize input columns, output paths, and the forecast horizon.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete forecasting workflow.
fn run_forecast(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    if let Err(e) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", e);
    }

    if !args.quiet {
        println!("📥 Reading transactions: {}", config.input.path.display());
        println!(
            "🔮 Forecasting {} months ahead ({:.0}% confidence)",
            config.forecast.horizon,
            config.forecast.confidence_level * 100.0
        );
    }

    let mut engine = TrendSeasonalEngine::new(EngineConfig::from(&config.forecast));
    let result = pipeline::run(&config, &mut engine, !args.quiet)?;

    if !args.quiet {
        print_summary(&config, &result, start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

/// Print the run summary.
fn print_summary(config: &Config, result: &RunResult, duration: f64) {
    let observations = &result.aggregate.observations;
    let summary = &result.summary;

    println!("\n📊 Run Summary:");
    println!(
        "   Rows used: {} | Rows dropped: {}",
        result.aggregate.kept_rows, result.aggregate.dropped_rows
    );
    if let (Some(first), Some(last)) = (observations.first(), observations.last()) {
        println!(
            "   Months: {} ({} to {}) | Horizon: {}",
            observations.len(),
            first.period.label(),
            last.period.label(),
            config.forecast.horizon
        );
    }
    println!(
        "   Total sales: {} | Monthly average: {}",
        format_currency(summary.total_sales),
        format_currency(summary.average_sales)
    );

    if let Some(next) = result.forecast.iter().find(|p| p.is_future) {
        println!(
            "   Next month: {} {} (range {} to {})",
            next.period.label(),
            format_currency(next.point_estimate),
            format_currency(next.lower_bound),
            format_currency(next.upper_bound)
        );
    }

    let marker = match summary.trend_direction {
        TrendDirection::Increase => "🟢",
        TrendDirection::Decline => "🔴",
    };
    println!(
        "   {} Expected {} of {:.2}% for {}",
        marker,
        summary.trend_direction,
        summary.growth_rate.abs() * 100.0,
        summary.growth_period.label()
    );
    println!("   Duration: {:.1}s", duration);

    println!("\n📁 Outputs:");
    println!("   Cleaned data:    {}", config.output.cleaned_csv.display());
    println!("   Monthly summary: {}", config.output.monthly_csv.display());
    println!("   Execution log:   {}", config.output.log.display());
    println!(
        "\n✅ Forecast complete! {}-page report saved to: {}",
        result.report.pages.len(),
        config.output.report.display()
    );
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
