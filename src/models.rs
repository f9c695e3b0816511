//! Data models for the forecasting pipeline.
//!
//! This module contains the core data structures passed between pipeline
//! stages: raw transactions, the monthly series, forecast points, the
//! insight summary, and the report artifact.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// A calendar month, stored as its first day.
///
/// Ordering is chronological. The canonical date form is the month-end
/// anchor, matching how the monthly summary table labels periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod(NaiveDate);

impl MonthPeriod {
    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date - Duration::days(date.day0() as i64))
    }

    /// Build a period from a year and a 1-based month.
    pub fn from_ymd(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First calendar day of the month.
    #[allow(dead_code)] // Accessor kept alongside month_end
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Last calendar day of the month (the month-end anchor).
    pub fn month_end(&self) -> NaiveDate {
        self.succ().0 - Duration::days(1)
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        self.plus_months(1)
    }

    /// The month `n` months after this one.
    pub fn plus_months(&self, n: usize) -> Self {
        Self(self.0 + Months::new(n as u32))
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(&self, earlier: &MonthPeriod) -> i64 {
        (self.year() as i64 - earlier.year() as i64) * 12
            + (self.month() as i64 - earlier.month() as i64)
    }

    /// Human label, e.g. `February 2024`.
    pub fn label(&self) -> String {
        self.0.format("%B %Y").to_string()
    }

    /// Full month name, e.g. `February`.
    pub fn month_name(&self) -> String {
        self.0.format("%B").to_string()
    }

    /// Abbreviated month name, e.g. `Feb`.
    pub fn month_abbrev(&self) -> String {
        self.0.format("%b").to_string()
    }

    /// Quarter label, e.g. `2024Q1`.
    pub fn quarter(&self) -> String {
        format!("{}Q{}", self.year(), (self.month() - 1) / 3 + 1)
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Serialize for MonthPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row from the input log, before cleaning.
///
/// `date` and `amount` are `None` when the cell was empty or unparsable.
#[derive(Debug, Clone)]
pub struct RawTransaction {
    /// 1-based data row number in the source file.
    pub line_number: usize,
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    /// All original cells, carried through for the cleaned export.
    pub fields: Vec<String>,
}

impl RawTransaction {
    /// Returns the usable date and amount, if both are present and valid.
    pub fn valid_parts(&self) -> Option<(NaiveDate, f64)> {
        match (self.date, self.amount) {
            (Some(date), Some(amount)) if amount.is_finite() => Some((date, amount)),
            _ => None,
        }
    }
}

/// Total sales for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyObservation {
    pub period: MonthPeriod,
    pub total: f64,
}

/// Forecast value with uncertainty bounds for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub period: MonthPeriod,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// True when the period lies after the last observed month.
    pub is_future: bool,
}

/// Direction of the expected change between the last two future months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increase,
    Decline,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increase => write!(f, "increase"),
            TrendDirection::Decline => write!(f, "decline"),
        }
    }
}

impl TrendDirection {
    /// Returns an emoji representation of the direction.
    pub fn emoji(&self) -> &'static str {
        match self {
            TrendDirection::Increase => "📈",
            TrendDirection::Decline => "📉",
        }
    }
}

/// Business insights derived from the history and the future forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub total_sales: f64,
    pub average_sales: f64,
    pub best_period: MonthPeriod,
    pub best_value: f64,
    pub worst_period: MonthPeriod,
    pub worst_value: f64,
    pub growth_rate: f64,
    pub trend_direction: TrendDirection,
    /// Latest future month, the one the growth rate refers to.
    pub growth_period: MonthPeriod,
    pub narrative: String,
    pub recommendations: Vec<String>,
}

/// A named series produced by the forecast engine's component breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSeries {
    pub name: String,
    pub values: Vec<(MonthPeriod, f64)>,
}

/// Engine-provided decomposition of a forecast into its components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentBreakdown {
    pub engine: String,
    pub components: Vec<ComponentSeries>,
}

/// One page of the report. Page position is part of the output contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Page {
    /// Historical totals as a line chart.
    LineChart {
        title: String,
        history: Vec<MonthlyObservation>,
    },
    /// History overlaid with the full forecast and its band.
    OverlayChart {
        title: String,
        history: Vec<MonthlyObservation>,
        forecast: Vec<ForecastPoint>,
    },
    /// Future forecast points only, with their band.
    FutureChart {
        title: String,
        forecast: Vec<ForecastPoint>,
    },
    /// Component breakdown, as produced by the forecast engine.
    Decomposition {
        title: String,
        breakdown: ComponentBreakdown,
    },
    /// Narrative executive summary, no chart.
    TextSummary {
        title: String,
        summary: InsightSummary,
    },
}

impl Page {
    pub fn title(&self) -> &str {
        match self {
            Page::LineChart { title, .. }
            | Page::OverlayChart { title, .. }
            | Page::FutureChart { title, .. }
            | Page::Decomposition { title, .. }
            | Page::TextSummary { title, .. } => title,
        }
    }
}

/// Metadata about a report run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    /// Source file the history was built from.
    pub input_path: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Name of the forecast engine used.
    pub engine: String,
    /// Number of future months forecast.
    pub horizon: usize,
    /// Input rows kept after cleaning.
    pub rows_kept: usize,
    /// Input rows dropped during cleaning.
    pub rows_dropped: usize,
}

/// The complete paginated report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportArtifact {
    pub title: String,
    pub metadata: ReportMetadata,
    pub pages: Vec<Page>,
}

/// Format a value as dollars with thousands separators, e.g. `$12,345.68`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(year: i32, month: u32) -> MonthPeriod {
        MonthPeriod::from_ymd(year, month).unwrap()
    }

    #[test]
    fn test_period_from_date_normalizes_to_month() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 17).unwrap();
        let p = MonthPeriod::from_date(date);
        assert_eq!(p, period(2024, 2));
        assert_eq!(p.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_month_end_handles_leap_years() {
        assert_eq!(
            period(2024, 2).month_end(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            period(2023, 2).month_end(),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            period(2024, 12).month_end(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_succ_crosses_year_boundary() {
        assert_eq!(period(2024, 12).succ(), period(2025, 1));
        assert_eq!(period(2024, 11).plus_months(3), period(2025, 2));
        assert_eq!(period(2024, 5).plus_months(0), period(2024, 5));
        assert_eq!(period(2022, 1).plus_months(50), period(2026, 3));
        assert_eq!(period(2025, 2).months_since(&period(2024, 11)), 3);
        assert_eq!(period(2024, 1).months_since(&period(2024, 3)), -2);
    }

    #[test]
    fn test_period_labels() {
        let p = period(2024, 5);
        assert_eq!(p.to_string(), "2024-05");
        assert_eq!(p.label(), "May 2024");
        assert_eq!(p.month_abbrev(), "May");
        assert_eq!(period(2024, 11).quarter(), "2024Q4");
        assert_eq!(period(2024, 3).quarter(), "2024Q1");
    }

    #[test]
    fn test_period_serializes_as_short_label() {
        let json = serde_json::to_string(&period(2024, 1)).unwrap();
        assert_eq!(json, "\"2024-01\"");
    }

    #[test]
    fn test_valid_parts_rejects_missing_and_non_finite() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5);
        let row = |date, amount| RawTransaction {
            line_number: 1,
            date,
            amount,
            fields: Vec::new(),
        };
        assert!(row(date, Some(10.0)).valid_parts().is_some());
        assert!(row(None, Some(10.0)).valid_parts().is_none());
        assert!(row(date, None).valid_parts().is_none());
        assert!(row(date, Some(f64::NAN)).valid_parts().is_none());
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1234.567), "$1,234.57");
        assert_eq!(format_currency(1234567.0), "$1,234,567.00");
        assert_eq!(format_currency(-1500.0), "-$1,500.00");
    }

    #[test]
    fn test_trend_direction_display() {
        assert_eq!(TrendDirection::Increase.to_string(), "increase");
        assert_eq!(TrendDirection::Decline.to_string(), "decline");
        assert_eq!(TrendDirection::Increase.emoji(), "📈");
    }
}
