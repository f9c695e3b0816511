//! Business insights from the monthly series and its forecast.

use crate::error::{PipelineError, Result};
use crate::models::{
    format_currency, ForecastPoint, InsightSummary, MonthlyObservation, TrendDirection,
};

/// Derive the insight summary for a run.
///
/// Totals and extrema come from the history only. The growth rate compares
/// the two chronologically last future forecast points.
pub fn summarize(
    history: &[MonthlyObservation],
    forecast: &[ForecastPoint],
) -> Result<InsightSummary> {
    let first = history.first().ok_or(PipelineError::EmptyHistory)?;

    let total_sales: f64 = history.iter().map(|o| o.total).sum();
    let average_sales = total_sales / history.len() as f64;

    // Strict comparisons keep the earliest period on ties
    let (mut best, mut worst) = (first, first);
    for obs in history {
        if obs.total > best.total {
            best = obs;
        }
        if obs.total < worst.total {
            worst = obs;
        }
    }

    let mut future: Vec<&ForecastPoint> = forecast.iter().filter(|p| p.is_future).collect();
    future.sort_by_key(|p| p.period);

    let (previous, latest) = match future.as_slice() {
        [.., previous, latest] => (*previous, *latest),
        _ => {
            return Err(PipelineError::InsufficientForecastHorizon {
                required: 2,
                actual: future.len(),
            })
        }
    };

    if previous.point_estimate == 0.0 {
        return Err(PipelineError::DivisionByZero(previous.period.label()));
    }

    let growth_rate = (latest.point_estimate - previous.point_estimate) / previous.point_estimate;
    let trend_direction = if growth_rate > 0.0 {
        TrendDirection::Increase
    } else {
        TrendDirection::Decline
    };

    let growth_sentence = format!(
        "Expected {} {} of {:.2}% in sales for {}.",
        trend_direction,
        trend_direction.emoji(),
        growth_rate.abs() * 100.0,
        latest.period.label()
    );

    let narrative = [
        format!("Total Sales Analyzed: {}", format_currency(total_sales)),
        format!("Average Monthly Sales: {}", format_currency(average_sales)),
        format!(
            "Best Month: {} ({})",
            best.period.label(),
            format_currency(best.total)
        ),
        format!(
            "Worst Month: {} ({})",
            worst.period.label(),
            format_currency(worst.total)
        ),
        growth_sentence,
    ]
    .join("\n");

    let recommendations = vec![
        format!(
            "Plan inventory around peaks like {}.",
            best.period.month_name()
        ),
        format!("Investigate {} performance.", worst.period.month_name()),
        "Use forecasts for vendor negotiation and budgeting.".to_string(),
    ];

    Ok(InsightSummary {
        total_sales,
        average_sales,
        best_period: best.period,
        best_value: best.total,
        worst_period: worst.period,
        worst_value: worst.total,
        growth_rate,
        trend_direction,
        growth_period: latest.period,
        narrative,
        recommendations,
    })
}
