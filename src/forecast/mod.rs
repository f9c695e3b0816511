//! Forecasting.
//!
//! The statistical model sits behind [`ForecastEngine`]. [`forecast`] shapes
//! whatever the engine returns into a contiguous monthly sequence of
//! [`ForecastPoint`]s covering the history plus the requested horizon.

pub mod engine;

pub use engine::{EngineConfig, TrendSeasonalEngine};

use crate::error::{PipelineError, Result};
use crate::models::{ComponentBreakdown, ForecastPoint, MonthPeriod, MonthlyObservation};
use std::collections::HashMap;
use tracing::{debug, info};

/// Minimum number of monthly observations required to fit.
pub const MIN_HISTORY: usize = 2;

/// One engine estimate, before it is shaped into a [`ForecastPoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineEstimate {
    pub period: MonthPeriod,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A forecasting model the pipeline can delegate to.
pub trait ForecastEngine {
    /// Short name shown in the report metadata.
    fn name(&self) -> &str;

    /// Fit on the history and predict every month from the first observed
    /// period through `horizon` months past the last.
    fn fit_and_predict(
        &mut self,
        history: &[MonthlyObservation],
        horizon: usize,
    ) -> Result<Vec<EngineEstimate>>;

    /// Break the fitted model down into its components over `forecast`.
    fn render_component_breakdown(&self, forecast: &[ForecastPoint]) -> Result<ComponentBreakdown>;
}

/// Produce the forecast sequence for `history` plus `horizon` future months.
pub fn forecast(
    engine: &mut dyn ForecastEngine,
    history: &[MonthlyObservation],
    horizon: usize,
) -> Result<Vec<ForecastPoint>> {
    if horizon == 0 {
        return Err(PipelineError::InvalidHorizon(horizon));
    }

    let (first, last) = match (history.first(), history.last()) {
        (Some(first), Some(last)) if history.len() >= MIN_HISTORY => (first.period, last.period),
        _ => {
            return Err(PipelineError::InsufficientHistory {
                required: MIN_HISTORY,
                actual: history.len(),
            })
        }
    };

    info!(
        "Fitting {} on {} months, forecasting {} ahead",
        engine.name(),
        history.len(),
        horizon
    );

    let estimates = engine.fit_and_predict(history, horizon)?;

    let mut by_period: HashMap<MonthPeriod, EngineEstimate> = HashMap::new();
    for estimate in estimates {
        by_period.entry(estimate.period).or_insert(estimate);
    }

    let end = last.plus_months(horizon);
    let mut points = Vec::new();
    let mut period = first;

    while period <= end {
        let estimate = by_period
            .get(&period)
            .ok_or_else(|| PipelineError::EngineContract(period.to_string()))?;

        let point_estimate = estimate.estimate;
        points.push(ForecastPoint {
            period,
            point_estimate,
            lower_bound: estimate.lower.min(estimate.upper).min(point_estimate),
            upper_bound: estimate.upper.max(estimate.lower).max(point_estimate),
            is_future: period > last,
        });
        period = period.succ();
    }

    debug!(
        "Forecast covers {} to {} ({} points)",
        first,
        end,
        points.len()
    );

    Ok(points)
}
