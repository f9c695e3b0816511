//! Output file writing.
//!
//! Every artifact is written to a temporary file next to its destination and
//! renamed into place, so a failed run never leaves a half-written file.
//! [`write_all_atomic`] stages a whole set of files before moving any of
//! them. The execution log is the only file opened for appending.

use crate::error::{PipelineError, Result};
use crate::models::{MonthPeriod, MonthlyObservation, RawTransaction};
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Columns appended to every cleaned row.
const DERIVED_COLUMNS: [&str; 3] = ["Year", "Month", "Quarter"];

#[derive(Debug, Serialize)]
struct MonthlyRow {
    #[serde(rename = "Month")]
    month: NaiveDate,
    #[serde(rename = "Total Sales")]
    total: f64,
}

/// Content written and synced beside its destination, not yet in place.
#[derive(Debug)]
pub struct StagedFile {
    tmp: NamedTempFile,
    path: PathBuf,
    len: usize,
}

impl StagedFile {
    /// Move the staged content over the destination.
    pub fn commit(self) -> Result<()> {
        self.tmp
            .persist(&self.path)
            .map_err(|e| PipelineError::Io(e.error))?;
        debug!("Wrote {} bytes to {}", self.len, self.path.display());
        Ok(())
    }
}

/// Write `content` to a temporary file in the destination directory,
/// creating parent directories. The destination is left untouched.
pub fn stage_file(path: &Path, content: &[u8]) -> Result<StagedFile> {
    if path.is_dir() {
        return Err(PipelineError::OutputIsDirectory(path.to_path_buf()));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;

    Ok(StagedFile {
        tmp,
        path: path.to_path_buf(),
        len: content.len(),
    })
}

/// Write a set of files so that none is replaced unless all of them could
/// be staged.
pub fn write_all_atomic(files: &[(&Path, &[u8])]) -> Result<()> {
    let staged = files
        .iter()
        .map(|(path, content)| stage_file(path, content))
        .collect::<Result<Vec<_>>>()?;

    for file in staged {
        file.commit()?;
    }

    Ok(())
}

/// Cleaned transaction table: original columns plus `Year`, `Month` and
/// `Quarter`, valid rows only.
pub fn render_cleaned_csv(headers: &[String], records: &[&RawTransaction]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let header_row: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .chain(DERIVED_COLUMNS)
        .collect();
    wtr.write_record(&header_row)?;

    for record in records {
        let Some((date, _)) = record.valid_parts() else {
            continue;
        };
        let period = MonthPeriod::from_date(date);

        let mut row: Vec<String> = record.fields.clone();
        row.resize(headers.len(), String::new());
        row.push(period.year().to_string());
        row.push(period.month_abbrev());
        row.push(period.quarter());
        wtr.write_record(&row)?;
    }

    wtr.into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))
}

/// Monthly aggregate table with month-end dates.
pub fn render_monthly_csv(observations: &[MonthlyObservation]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    for obs in observations {
        wtr.serialize(MonthlyRow {
            month: obs.period.month_end(),
            total: obs.total,
        })?;
    }

    wtr.into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))
}

/// Append one run entry to the execution log.
pub fn append_run_log<Tz>(path: &Path, at: &DateTime<Tz>) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "Data pipeline updated at {}",
        at.format("%Y-%m-%d %H:%M:%S")
    )?;
    file.sync_all()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(line: usize, date: &str, amount: Option<f64>, fields: &[&str]) -> RawTransaction {
        RawTransaction {
            line_number: line,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            amount,
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn write_one(path: &Path, content: &[u8]) -> Result<()> {
        write_all_atomic(&[(path, content)])
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/report.md");

        write_one(&path, b"hello").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        // Only the persisted file remains
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.md");
        fs::write(&path, "old").unwrap();

        write_one(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_directory_target_leaves_every_file_untouched() {
        let dir = TempDir::new().unwrap();
        let cleaned = dir.path().join("cleaned.csv");
        let monthly = dir.path().join("monthly.csv");
        let report = dir.path().join("report.md");
        fs::write(&cleaned, "old cleaned").unwrap();
        fs::create_dir(&report).unwrap();
        fs::write(report.join("keep.txt"), "x").unwrap();

        let err = write_all_atomic(&[
            (cleaned.as_path(), b"new cleaned".as_slice()),
            (monthly.as_path(), b"new monthly".as_slice()),
            (report.as_path(), b"new report".as_slice()),
        ])
        .unwrap_err();

        assert!(matches!(err, PipelineError::OutputIsDirectory(ref p) if *p == report));
        assert_eq!(fs::read_to_string(&cleaned).unwrap(), "old cleaned");
        assert!(!monthly.exists());
        assert!(report.is_dir());
        // Staged temp files are cleaned up on drop
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_unwritable_directory_stages_nothing() {
        let dir = TempDir::new().unwrap();
        let cleaned = dir.path().join("cleaned.csv");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();
        let report = blocker.join("report.md");

        let result = write_all_atomic(&[
            (cleaned.as_path(), b"new".as_slice()),
            (report.as_path(), b"new".as_slice()),
        ]);

        assert!(result.is_err());
        assert!(!cleaned.exists());
    }

    #[test]
    fn test_render_cleaned_csv_adds_derived_columns() {
        let headers = vec!["Order Date".to_string(), "Sales".to_string()];
        let good = record(1, "2024-05-07", Some(10.0), &["2024-05-07", "10"]);
        let short = record(2, "2024-11-30", Some(3.5), &["2024-11-30"]);
        let bad = record(3, "bogus", Some(1.0), &["bogus", "1"]);

        let bytes = render_cleaned_csv(&headers, &[&good, &short, &bad]).unwrap();

        let content = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Order Date,Sales,Year,Month,Quarter");
        assert_eq!(lines[1], "2024-05-07,10,2024,May,2024Q2");
        assert_eq!(lines[2], "2024-11-30,,2024,Nov,2024Q4");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_render_monthly_csv_uses_month_end() {
        let observations = vec![
            MonthlyObservation {
                period: MonthPeriod::from_ymd(2024, 1).unwrap(),
                total: 1000.0,
            },
            MonthlyObservation {
                period: MonthPeriod::from_ymd(2024, 2).unwrap(),
                total: 1200.5,
            },
        ];

        let bytes = render_monthly_csv(&observations).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Month,Total Sales\n2024-01-31,1000.0\n2024-02-29,1200.5\n"
        );
    }

    #[test]
    fn test_append_run_log_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline_log.txt");
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 5).unwrap();

        append_run_log(&path, &at).unwrap();
        append_run_log(&path, &at).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Data pipeline updated at 2024-06-01 08:00:05\n\
             Data pipeline updated at 2024-06-01 08:00:05\n"
        );
    }
}
