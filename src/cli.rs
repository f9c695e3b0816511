//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. Every flag is
//! optional: a bare invocation runs the pipeline with the configuration file
//! (or built-in defaults).

use crate::config::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// Sales Forecaster - monthly sales forecast and report from a transaction log
///
/// Cleans a raw sales CSV, aggregates it into monthly totals, forecasts the
/// coming months and writes a five-page report with a narrative summary.
///
/// Examples:
///   sales-forecaster
///   sales-forecaster --input data/superstore.csv --horizon 12
///   sales-forecaster --format json --output forecast.json
///   sales-forecaster --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .sales-forecaster.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Transaction CSV to read (overrides config)
    #[arg(short, long, value_name = "FILE", env = "SALES_FORECASTER_INPUT")]
    pub input: Option<PathBuf>,

    /// Number of future months to forecast (overrides config)
    #[arg(long, value_name = "MONTHS")]
    pub horizon: Option<usize>,

    /// Output file path for the report (overrides config)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .sales-forecaster.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(0) = self.horizon {
            return Err("Horizon must be at least 1 month".to_string());
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            input: None,
            horizon: None,
            output: None,
            format: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_no_flags_is_valid() {
        let args = Args::try_parse_from(["sales-forecaster"]).unwrap();
        assert!(args.input.is_none());
        assert!(args.horizon.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_overrides() {
        let args = Args::try_parse_from([
            "sales-forecaster",
            "--input",
            "sales.csv",
            "--horizon",
            "12",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("sales.csv")));
        assert_eq!(args.horizon, Some(12));
        assert_eq!(args.format, Some(ReportFormat::Json));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_horizon() {
        let mut args = make_args();
        args.horizon = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_config_file() {
        let mut args = make_args();
        args.config = Some(PathBuf::from("/nonexistent/.sales-forecaster.toml"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
