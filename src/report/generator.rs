//! Report rendering.
//!
//! This module turns a [`ReportArtifact`] into the document written to disk,
//! either Markdown (pages separated by page breaks) or JSON.

use super::chart::{band_chart, band_legend, bar_chart, BandRow};
use crate::config::ReportFormat;
use crate::error::Result;
use crate::models::{
    format_currency, ComponentBreakdown, ForecastPoint, InsightSummary, MonthlyObservation, Page,
    ReportArtifact, ReportMetadata,
};
use std::collections::HashMap;

/// Marker placed between Markdown pages.
pub const PAGE_BREAK: &str = "<div style=\"page-break-after: always;\"></div>";

/// Turns a report artifact into file content.
pub trait ReportRenderer {
    fn render(&self, artifact: &ReportArtifact) -> Result<String>;
}

/// Markdown document with text charts.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    pub chart_width: usize,
}

/// Pretty-printed JSON document.
#[derive(Debug, Clone, Default)]
pub struct JsonRenderer;

/// Pick the renderer for a report format.
pub fn renderer_for(format: ReportFormat, chart_width: usize) -> Box<dyn ReportRenderer> {
    match format {
        ReportFormat::Markdown => Box::new(MarkdownRenderer { chart_width }),
        ReportFormat::Json => Box::new(JsonRenderer),
    }
}

impl ReportRenderer for JsonRenderer {
    fn render(&self, artifact: &ReportArtifact) -> Result<String> {
        serde_json::to_string_pretty(artifact).map_err(Into::into)
    }
}

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, artifact: &ReportArtifact) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", artifact.title));
        output.push_str(&generate_metadata_section(&artifact.metadata));
        output.push_str(&generate_table_of_contents(&artifact.pages));

        for (i, page) in artifact.pages.iter().enumerate() {
            output.push_str(PAGE_BREAK);
            output.push_str("\n\n");
            output.push_str(&format!("## Page {}: {}\n\n", i + 1, page.title()));
            output.push_str(&self.generate_page(page));
        }

        output.push_str(&generate_footer());

        Ok(output)
    }
}

impl MarkdownRenderer {
    fn generate_page(&self, page: &Page) -> String {
        match page {
            Page::LineChart { history, .. } => self.generate_history_page(history),
            Page::OverlayChart {
                history, forecast, ..
            } => self.generate_overlay_page(history, forecast),
            Page::FutureChart { forecast, .. } => self.generate_future_page(forecast),
            Page::Decomposition { breakdown, .. } => self.generate_components_page(breakdown),
            Page::TextSummary { summary, .. } => generate_summary_page(summary),
        }
    }

    /// Page 1: historical totals.
    fn generate_history_page(&self, history: &[MonthlyObservation]) -> String {
        let mut section = String::new();

        let rows: Vec<(String, f64)> = history
            .iter()
            .map(|o| (o.period.to_string(), o.total))
            .collect();
        section.push_str(&code_block(&bar_chart(&rows, self.chart_width)));

        section.push_str("| Month | Sales |\n");
        section.push_str("|:---|---:|\n");
        for obs in history {
            section.push_str(&format!(
                "| {} | {} |\n",
                obs.period.label(),
                format_currency(obs.total)
            ));
        }
        section.push('\n');

        section
    }

    /// Page 2: history overlaid with the full forecast.
    fn generate_overlay_page(
        &self,
        history: &[MonthlyObservation],
        forecast: &[ForecastPoint],
    ) -> String {
        let mut section = String::new();

        let actuals: HashMap<_, _> = history.iter().map(|o| (o.period, o.total)).collect();
        let rows: Vec<BandRow> = forecast
            .iter()
            .map(|p| BandRow {
                label: p.period.to_string(),
                lower: p.lower_bound,
                estimate: p.point_estimate,
                upper: p.upper_bound,
                actual: actuals.get(&p.period).copied(),
            })
            .collect();

        section.push_str(&code_block(&band_chart(&rows, self.chart_width)));
        section.push_str(&format!("{}\n\n", band_legend(true)));

        section.push_str("| Month | Actual | Forecast | Lower | Upper |\n");
        section.push_str("|:---|---:|---:|---:|---:|\n");
        for p in forecast {
            let actual = actuals
                .get(&p.period)
                .map(|v| format_currency(*v))
                .unwrap_or_else(|| "-".to_string());
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                p.period.label(),
                actual,
                format_currency(p.point_estimate),
                format_currency(p.lower_bound),
                format_currency(p.upper_bound)
            ));
        }
        section.push('\n');

        section
    }

    /// Page 3: future months only.
    fn generate_future_page(&self, forecast: &[ForecastPoint]) -> String {
        let mut section = String::new();

        let rows: Vec<BandRow> = forecast
            .iter()
            .map(|p| BandRow {
                label: p.period.to_string(),
                lower: p.lower_bound,
                estimate: p.point_estimate,
                upper: p.upper_bound,
                actual: None,
            })
            .collect();

        section.push_str(&code_block(&band_chart(&rows, self.chart_width)));
        section.push_str(&format!("{}\n\n", band_legend(false)));

        section.push_str("| Month | Forecast | Lower | Upper |\n");
        section.push_str("|:---|---:|---:|---:|\n");
        for p in forecast {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                p.period.label(),
                format_currency(p.point_estimate),
                format_currency(p.lower_bound),
                format_currency(p.upper_bound)
            ));
        }
        section.push('\n');

        section
    }

    /// Page 4: engine components, drawn without interpretation.
    fn generate_components_page(&self, breakdown: &ComponentBreakdown) -> String {
        let mut section = String::new();

        section.push_str(&format!(
            "*Components reported by the `{}` engine.*\n\n",
            breakdown.engine
        ));

        for component in &breakdown.components {
            section.push_str(&format!("### {}\n\n", component.name));
            let rows: Vec<(String, f64)> = component
                .values
                .iter()
                .map(|(period, value)| (period.to_string(), *value))
                .collect();
            section.push_str(&code_block(&bar_chart(&rows, self.chart_width)));
        }

        section
    }
}

/// Page 5: narrative and recommendations.
fn generate_summary_page(summary: &InsightSummary) -> String {
    let mut section = String::new();

    section.push_str("### Key Figures\n\n");
    for line in summary.narrative.lines() {
        section.push_str(&format!("- {}\n", line));
    }
    section.push('\n');

    if !summary.recommendations.is_empty() {
        section.push_str("### Recommendations\n\n");
        for (i, rec) in summary.recommendations.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        section.push('\n');
    }

    section
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input_path));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Forecast Engine:** `{}`\n", metadata.engine));
    section.push_str(&format!(
        "- **Forecast Horizon:** {} months\n",
        metadata.horizon
    ));
    section.push_str(&format!("- **Rows Used:** {}\n", metadata.rows_kept));
    if metadata.rows_dropped > 0 {
        section.push_str(&format!("- **Rows Dropped:** {}\n", metadata.rows_dropped));
    }
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(pages: &[Page]) -> String {
    let mut toc = String::new();

    toc.push_str("## Contents\n\n");
    for (i, page) in pages.iter().enumerate() {
        toc.push_str(&format!("{}. {}\n", i + 1, page.title()));
    }
    toc.push('\n');

    toc
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by sales-forecaster*\n");

    footer
}

fn code_block(body: &str) -> String {
    format!("```text\n{}```\n\n", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::compose;
    use crate::report::composer::tests::sample_inputs;

    fn create_test_report() -> ReportArtifact {
        let (engine, history, points, summary, metadata) = sample_inputs();
        compose(&history, &points, &summary, &engine, metadata).unwrap()
    }

    #[test]
    fn test_markdown_has_five_pages_in_order() {
        let artifact = create_test_report();
        let markdown = MarkdownRenderer { chart_width: 30 }.render(&artifact).unwrap();

        assert_eq!(markdown.matches("## Page ").count(), 5);
        assert_eq!(markdown.matches(PAGE_BREAK).count(), 5);

        let positions: Vec<usize> = [
            "## Page 1: Total Monthly Sales Trend",
            "## Page 2: Forecasted Sales with Confidence Interval",
            "## Page 3: Future Sales Forecast (Next 3 Months)",
            "## Page 4: Forecast Components",
            "## Page 5: Executive Summary",
        ]
        .iter()
        .map(|heading| markdown.find(heading).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_markdown_contains_metadata_and_narrative() {
        let artifact = create_test_report();
        let markdown = MarkdownRenderer { chart_width: 30 }.render(&artifact).unwrap();

        assert!(markdown.starts_with("# Sales Forecast Report (June 2024)"));
        assert!(markdown.contains("- **Input:** `sales.csv`"));
        assert!(markdown.contains("- **Rows Dropped:** 2"));
        assert!(markdown.contains("- Total Sales Analyzed: $5,650.00"));
        assert!(markdown.contains("### Recommendations"));
        assert!(markdown.contains("### Trend"));
    }

    #[test]
    fn test_summary_page_has_no_chart() {
        let artifact = create_test_report();
        let page = match &artifact.pages[4] {
            Page::TextSummary { summary, .. } => generate_summary_page(summary),
            other => panic!("unexpected page: {:?}", other),
        };

        assert!(!page.contains("```"));
        assert!(page.contains("Expected"));
    }

    #[test]
    fn test_metadata_section_hides_zero_drops() {
        let mut artifact = create_test_report();
        artifact.metadata.rows_dropped = 0;
        let section = generate_metadata_section(&artifact.metadata);

        assert!(section.contains("Forecast Horizon:** 3 months"));
        assert!(!section.contains("Rows Dropped"));
    }

    #[test]
    fn test_json_report() {
        let artifact = create_test_report();
        let json = JsonRenderer.render(&artifact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let pages = value["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 5);
        assert_eq!(pages[0]["kind"], "line_chart");
        assert_eq!(pages[3]["kind"], "decomposition");
        assert_eq!(pages[4]["kind"], "text_summary");
        assert_eq!(pages[4]["summary"]["best_period"], "2024-04");
    }

    #[test]
    fn test_renderer_for_format() {
        let artifact = create_test_report();
        let json = renderer_for(ReportFormat::Json, 30).render(&artifact).unwrap();
        let markdown = renderer_for(ReportFormat::Markdown, 30)
            .render(&artifact)
            .unwrap();

        assert!(json.trim_start().starts_with('{'));
        assert!(markdown.starts_with("# "));
    }
}
