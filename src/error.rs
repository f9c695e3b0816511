//! Error types for the forecasting pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Aggregate,
    Forecast,
    Insights,
    Report,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingest => write!(f, "Ingest"),
            Stage::Aggregate => write!(f, "Aggregate"),
            Stage::Forecast => write!(f, "Forecast"),
            Stage::Insights => write!(f, "Insights"),
            Stage::Report => write!(f, "Report"),
            Stage::Output => write!(f, "Output"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input not found or unreadable: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Input column not found: {0}")]
    MissingColumn(String),

    #[error("No valid transactions left after cleaning")]
    NoValidData,

    #[error("History is empty")]
    EmptyHistory,

    #[error("Insufficient history: need at least {required} months, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Forecast horizon must be at least 1, got {0}")]
    InvalidHorizon(usize),

    #[error("Insufficient forecast horizon: need at least {required} future months, got {actual}")]
    InsufficientForecastHorizon { required: usize, actual: usize },

    #[error("Division by zero: previous forecast for {0} is zero")]
    DivisionByZero(String),

    #[error("Forecast engine returned no estimate for {0}")]
    EngineContract(String),

    #[error("Forecast engine has not been fitted")]
    NotFitted,

    #[error("Output path is a directory: {}", .0.display())]
    OutputIsDirectory(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A [`PipelineError`] tagged with the stage it aborted.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

/// Attach a [`Stage`] to a pipeline result.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_context_names_stage_and_condition() {
        let result: Result<()> = Err(PipelineError::InsufficientHistory {
            required: 2,
            actual: 1,
        });
        let err = result.stage(Stage::Forecast).unwrap_err();

        assert_eq!(err.stage, Stage::Forecast);
        assert_eq!(
            err.to_string(),
            "Forecast stage failed: Insufficient history: need at least 2 months, got 1"
        );
        assert!(matches!(err.source, PipelineError::InsufficientHistory { .. }));
    }

    #[test]
    fn test_missing_input_message() {
        let err = PipelineError::MissingInput(PathBuf::from("sales.csv"));
        assert_eq!(err.to_string(), "Input not found or unreadable: sales.csv");
    }

    #[test]
    fn test_error_messages_name_condition() {
        let err = PipelineError::InsufficientForecastHorizon {
            required: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient forecast horizon: need at least 2 future months, got 1"
        );
        assert_eq!(Stage::Insights.to_string(), "Insights");
    }
}
