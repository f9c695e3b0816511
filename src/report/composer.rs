//! Report composition.
//!
//! Assembles the five report pages in their fixed order. Consumers rely on
//! page position, so the order here must not change.

use crate::error::Result;
use crate::forecast::ForecastEngine;
use crate::models::{
    ForecastPoint, InsightSummary, MonthlyObservation, Page, ReportArtifact, ReportMetadata,
};
use tracing::debug;

/// Number of pages in every report.
pub const PAGE_COUNT: usize = 5;

/// Build the report artifact for a run.
///
/// The decomposition page is produced by `engine` as-is.
pub fn compose(
    history: &[MonthlyObservation],
    forecast: &[ForecastPoint],
    summary: &InsightSummary,
    engine: &dyn ForecastEngine,
    metadata: ReportMetadata,
) -> Result<ReportArtifact> {
    let future: Vec<ForecastPoint> = forecast.iter().filter(|p| p.is_future).copied().collect();
    let breakdown = engine.render_component_breakdown(forecast)?;

    let pages = vec![
        Page::LineChart {
            title: "Total Monthly Sales Trend".to_string(),
            history: history.to_vec(),
        },
        Page::OverlayChart {
            title: "Forecasted Sales with Confidence Interval".to_string(),
            history: history.to_vec(),
            forecast: forecast.to_vec(),
        },
        Page::FutureChart {
            title: format!("Future Sales Forecast (Next {} Months)", future.len()),
            forecast: future,
        },
        Page::Decomposition {
            title: "Forecast Components".to_string(),
            breakdown,
        },
        Page::TextSummary {
            title: "Executive Summary".to_string(),
            summary: summary.clone(),
        },
    ];

    debug_assert_eq!(pages.len(), PAGE_COUNT);
    debug!("Composed {} report pages", pages.len());

    Ok(ReportArtifact {
        title: format!(
            "Sales Forecast Report ({})",
            metadata.generated_at.format("%B %Y")
        ),
        metadata,
        pages,
    })
}
