//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sales-forecaster.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".sales-forecaster.toml";

/// Accepted seasonal cycle lengths, in months.
const SEASONAL_PERIOD_RANGE: std::ops::RangeInclusive<usize> = 2..=24;

/// Root configuration structure passed to the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Forecast settings.
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the raw sales log lives and which columns to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the transaction CSV.
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// Column holding the transaction date.
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Column holding the sale amount.
    #[serde(default = "default_amount_column")]
    pub amount_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            date_column: default_date_column(),
            amount_column: default_amount_column(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("sales_data.csv")
}

fn default_date_column() -> String {
    "Order Date".to_string()
}

fn default_amount_column() -> String {
    "Sales".to_string()
}

/// Paths of every file a run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Cleaned transaction table.
    #[serde(default = "default_cleaned_csv")]
    pub cleaned_csv: PathBuf,

    /// Monthly aggregate table.
    #[serde(default = "default_monthly_csv")]
    pub monthly_csv: PathBuf,

    /// Report artifact.
    #[serde(default = "default_report")]
    pub report: PathBuf,

    /// Append-only execution log.
    #[serde(default = "default_log")]
    pub log: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cleaned_csv: default_cleaned_csv(),
            monthly_csv: default_monthly_csv(),
            report: default_report(),
            log: default_log(),
        }
    }
}

fn default_cleaned_csv() -> PathBuf {
    PathBuf::from("cleaned_sales_data.csv")
}

fn default_monthly_csv() -> PathBuf {
    PathBuf::from("monthly_sales_summary.csv")
}

fn default_report() -> PathBuf {
    PathBuf::from("sales_forecast_report.md")
}

fn default_log() -> PathBuf {
    PathBuf::from("pipeline_log.txt")
}

/// Forecast model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of future months to forecast.
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Confidence level of the prediction band.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    /// Seasonal cycle length in months (2 to 24).
    #[serde(default = "default_seasonal_period")]
    pub seasonal_period: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            confidence_level: default_confidence_level(),
            seasonal_period: default_seasonal_period(),
        }
    }
}

fn default_horizon() -> usize {
    6
}

fn default_confidence_level() -> f64 {
    0.95
}

fn default_seasonal_period() -> usize {
    12
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown document (default)
    #[default]
    Markdown,
    /// JSON document
    Json,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format of the report artifact.
    #[serde(default)]
    pub format: ReportFormat,

    /// Width of text charts in characters.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            chart_width: default_chart_width(),
        }
    }
}

fn default_chart_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only arguments the user actually passed override config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.clone();
        }
        if let Some(horizon) = args.horizon {
            self.forecast.horizon = horizon;
        }
        if let Some(ref output) = args.output {
            self.output.report = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
    }

    /// Check values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let level = self.forecast.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err("Confidence level must be between 0 and 1 (exclusive)".to_string());
        }

        let period = self.forecast.seasonal_period;
        if !SEASONAL_PERIOD_RANGE.contains(&period) {
            return Err(format!(
                "Seasonal period must be between {} and {} months, got {}",
                SEASONAL_PERIOD_RANGE.start(),
                SEASONAL_PERIOD_RANGE.end(),
                period
            ));
        }

        if self.report.chart_width < 10 {
            return Err("Chart width must be at least 10 characters".to_string());
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.path, PathBuf::from("sales_data.csv"));
        assert_eq!(config.input.date_column, "Order Date");
        assert_eq!(config.forecast.horizon, 6);
        assert_eq!(config.report.format, ReportFormat::Markdown);
        assert_eq!(config.output.log, PathBuf::from("pipeline_log.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
path = "data/superstore.csv"
amount_column = "Revenue"

[output]
report = "out/report.json"

[forecast]
horizon = 12
confidence_level = 0.9

[report]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.path, PathBuf::from("data/superstore.csv"));
        assert_eq!(config.input.amount_column, "Revenue");
        assert_eq!(config.input.date_column, "Order Date");
        assert_eq!(config.output.report, PathBuf::from("out/report.json"));
        assert_eq!(
            config.output.monthly_csv,
            PathBuf::from("monthly_sales_summary.csv")
        );
        assert_eq!(config.forecast.horizon, 12);
        assert_eq!(config.forecast.confidence_level, 0.9);
        assert_eq!(config.forecast.seasonal_period, 12);
        assert_eq!(config.report.format, ReportFormat::Json);
    }

    #[test]
    fn test_validate_rejects_narrow_chart() {
        let mut config = Config::default();
        config.report.chart_width = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let mut config = Config::default();
        config.forecast.confidence_level = 1.5;
        assert!(config.validate().is_err());
        config.forecast.confidence_level = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_seasonal_period_bounds() {
        let mut config = Config::default();
        for period in [2, 5, 7, 13, 24] {
            config.forecast.seasonal_period = period;
            assert!(config.validate().is_ok(), "period {} rejected", period);
        }
        for period in [0, 1, 25, 60] {
            config.forecast.seasonal_period = period;
            assert!(config.validate().is_err(), "period {} accepted", period);
        }
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[forecast]"));
        assert!(toml_str.contains("[report]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[forecast]\nhorizon = 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.forecast.horizon, 3);
    }
}
