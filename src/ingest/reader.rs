//! CSV transaction log reader.
//!
//! Reads the raw sales log into [`RawTransaction`] rows. Cells that cannot be
//! parsed become `None`; the aggregator decides what to drop.

use crate::error::{PipelineError, Result};
use crate::models::RawTransaction;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column names used to pick the date and amount out of each row.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub date_column: String,
    pub amount_column: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            date_column: "Order Date".to_string(),
            amount_column: "Sales".to_string(),
        }
    }
}

impl From<&crate::config::InputConfig> for ReadOptions {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            date_column: config.date_column.clone(),
            amount_column: config.amount_column.clone(),
        }
    }
}

/// The parsed input log.
#[derive(Debug, Clone)]
pub struct TransactionLog {
    /// Header row of the source file.
    pub headers: Vec<String>,
    pub records: Vec<RawTransaction>,
}

/// Read a transaction log from a CSV file.
///
/// A missing or unopenable file is reported as [`PipelineError::MissingInput`].
pub fn read_transactions(path: &Path, options: &ReadOptions) -> Result<TransactionLog> {
    if !path.is_file() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| {
        warn!("Failed to open {}: {}", path.display(), e);
        PipelineError::MissingInput(path.to_path_buf())
    })?;

    let log = parse_transactions(file, options)?;
    info!(
        "Read {} rows from {}",
        log.records.len(),
        path.display()
    );
    Ok(log)
}

/// Parse a transaction log from any reader.
pub fn parse_transactions<R: Read>(reader: R, options: &ReadOptions) -> Result<TransactionLog> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = column_index(&headers, &options.date_column)?;
    let amount_idx = column_index(&headers, &options.amount_column)?;

    let mut records = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let line_number = i + 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                // Unreadable rows are kept as empty records so they count as dropped
                debug!("Row {} unreadable: {}", line_number, e);
                records.push(RawTransaction {
                    line_number,
                    date: None,
                    amount: None,
                    fields: Vec::new(),
                });
                continue;
            }
        };

        records.push(RawTransaction {
            line_number,
            date: record.get(date_idx).and_then(parse_date),
            amount: record.get(amount_idx).and_then(parse_amount),
            fields: record.iter().map(String::from).collect(),
        });
    }

    Ok(TransactionLog {
        headers: headers.iter().map(String::from).collect(),
        records,
    })
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
}

/// Parse a date cell. Returns `None` for empty or unrecognised values.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let date_formats = [
        "%Y-%m-%d", // 2024-01-15
        "%Y/%m/%d", // 2024/01/15
        "%m/%d/%Y", // 01/15/2024
    ];
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Parse an amount cell, handling currency symbols and thousands separators.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().replace(['$', ',', ' '], "");
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
