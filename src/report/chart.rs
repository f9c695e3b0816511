//! Fixed-width text charts for the Markdown report.

use crate::models::format_currency;

const BAR: char = '█';
const BAND: char = '─';
const ESTIMATE: char = '●';
const ACTUAL: char = '○';
const BOTH: char = '◉';

/// One row of a band chart.
#[derive(Debug, Clone)]
pub struct BandRow {
    pub label: String,
    pub lower: f64,
    pub estimate: f64,
    pub upper: f64,
    /// Observed value to mark alongside the estimate, if any.
    pub actual: Option<f64>,
}

/// Horizontal bar chart, one bar per row, scaled to `width` columns.
pub fn bar_chart(rows: &[(String, f64)], width: usize) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let min = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::min);
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let label_width = label_width(rows.iter().map(|(l, _)| l.as_str()));

    let mut chart = String::new();
    for (label, value) in rows {
        let zero = column(0.0, min, max, width);
        let end = column(*value, min, max, width);
        let (from, to) = if end < zero { (end, zero) } else { (zero, end) };

        let line: String = (0..width)
            .map(|i| if i >= from && i <= to && value.abs() > 0.0 { BAR } else { ' ' })
            .collect();

        chart.push_str(&format!(
            "{:<lw$} │{}│ {}\n",
            label,
            line,
            format_currency(*value),
            lw = label_width
        ));
    }

    chart
}

/// Band chart: the interval `[lower, upper]` drawn as a line with the
/// estimate (and optional actual) marked on it.
pub fn band_chart(rows: &[BandRow], width: usize) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let values = rows
        .iter()
        .flat_map(|r| [Some(r.lower), Some(r.upper), Some(r.estimate), r.actual])
        .flatten();
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    let label_width = label_width(rows.iter().map(|r| r.label.as_str()));

    let mut chart = String::new();
    for row in rows {
        let mut line = vec![' '; width];
        let from = column(row.lower, min, max, width);
        let to = column(row.upper, min, max, width);
        for cell in line.iter_mut().take(to + 1).skip(from) {
            *cell = BAND;
        }

        let estimate_col = column(row.estimate, min, max, width);
        line[estimate_col] = ESTIMATE;

        if let Some(actual) = row.actual {
            let actual_col = column(actual, min, max, width);
            line[actual_col] = if actual_col == estimate_col { BOTH } else { ACTUAL };
        }

        chart.push_str(&format!(
            "{:<lw$} │{}│ {}\n",
            row.label,
            line.into_iter().collect::<String>(),
            format_currency(row.estimate),
            lw = label_width
        ));
    }

    chart
}

/// Legend for [`band_chart`] output.
pub fn band_legend(with_actual: bool) -> String {
    if with_actual {
        format!(
            "`{}` actual, `{}` forecast, `{}` both, `{}` confidence band",
            ACTUAL, ESTIMATE, BOTH, BAND
        )
    } else {
        format!("`{}` forecast, `{}` confidence band", ESTIMATE, BAND)
    }
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0)
}

/// Column index of `value` on a `width`-column axis spanning `[min, max]`.
fn column(value: f64, min: f64, max: f64, width: usize) -> usize {
    let last = width.saturating_sub(1);
    let span = max - min;
    if !span.is_finite() || span.abs() < f64::EPSILON {
        return last / 2;
    }
    let scaled = ((value - min) / span * last as f64).round();
    (scaled.max(0.0) as usize).min(last)
}
