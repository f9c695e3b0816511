//! Bundled trend + seasonality forecasting engine.
//!
//! Fits y = intercept + slope * t by ordinary least squares, then adds
//! additive seasonal factors when the history spans at least two full
//! seasonal cycles. Prediction intervals come from the residual spread and
//! widen with the square root of the steps ahead.
//!
//! The model is deterministic: the same history always yields the same
//! estimates.

use super::{EngineEstimate, ForecastEngine};
use crate::error::{PipelineError, Result};
use crate::models::{
    ComponentBreakdown, ComponentSeries, ForecastPoint, MonthPeriod, MonthlyObservation,
};
use tracing::debug;

/// Settings for [`TrendSeasonalEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Confidence level of the prediction interval (e.g. 0.95).
    pub confidence_level: f64,
    /// Seasonal cycle length in months.
    pub seasonal_period: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            seasonal_period: 12,
        }
    }
}

impl From<&crate::config::ForecastConfig> for EngineConfig {
    fn from(config: &crate::config::ForecastConfig) -> Self {
        Self {
            confidence_level: config.confidence_level,
            seasonal_period: config.seasonal_period,
        }
    }
}

/// Parameters learned by a fit.
#[derive(Debug, Clone)]
struct FittedModel {
    start: MonthPeriod,
    observations: usize,
    intercept: f64,
    slope: f64,
    /// Additive factor per seasonal position; empty when not seasonal.
    seasonal: Vec<f64>,
    residual_std: f64,
}

impl FittedModel {
    fn trend_at(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }

    fn seasonal_at(&self, period: MonthPeriod) -> f64 {
        if self.seasonal.is_empty() {
            return 0.0;
        }
        self.seasonal[seasonal_position(period, self.start, self.seasonal.len())]
    }
}

/// Additive linear-trend and seasonal-factor model.
#[derive(Debug, Clone, Default)]
pub struct TrendSeasonalEngine {
    config: EngineConfig,
    fitted: Option<FittedModel>,
}

impl TrendSeasonalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Whether the model has been fitted.
    #[allow(dead_code)] // Used by tests
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fit(&self, history: &[MonthlyObservation]) -> Result<FittedModel> {
        let start = history
            .first()
            .map(|o| o.period)
            .ok_or(PipelineError::EmptyHistory)?;

        if history.len() < super::MIN_HISTORY {
            return Err(PipelineError::InsufficientHistory {
                required: super::MIN_HISTORY,
                actual: history.len(),
            });
        }

        // Time index is months since the first observation
        let points: Vec<(f64, f64)> = history
            .iter()
            .map(|o| (o.period.months_since(&start) as f64, o.total))
            .collect();

        let period = self.config.seasonal_period;
        let (intercept, slope, seasonal) = if period >= 2 && history.len() >= period * 2 {
            backfit(history, &points, period, start)
        } else {
            let (intercept, slope) = least_squares(&points);
            (intercept, slope, Vec::new())
        };

        let mut model = FittedModel {
            start,
            observations: history.len(),
            intercept,
            slope,
            seasonal,
            residual_std: 0.0,
        };

        let residuals: Vec<f64> = history
            .iter()
            .zip(points.iter())
            .map(|(o, (t, y))| y - (model.trend_at(*t) + model.seasonal_at(o.period)))
            .collect();
        model.residual_std = std_dev(&residuals);

        debug!(
            "Fitted trend slope {:.4}, intercept {:.4}, seasonal {}, residual sd {:.4}",
            model.slope,
            model.intercept,
            !model.seasonal.is_empty(),
            model.residual_std
        );

        Ok(model)
    }
}

impl ForecastEngine for TrendSeasonalEngine {
    fn name(&self) -> &str {
        "trend-seasonal"
    }

    fn fit_and_predict(
        &mut self,
        history: &[MonthlyObservation],
        horizon: usize,
    ) -> Result<Vec<EngineEstimate>> {
        let model = self.fit(history)?;
        let z = z_score(self.config.confidence_level);
        let total = model.observations + horizon;

        let estimates = (0..total)
            .map(|i| {
                let period = model.start.plus_months(i);
                let estimate = model.trend_at(i as f64) + model.seasonal_at(period);
                let steps_ahead = (i + 1).saturating_sub(model.observations);
                let spread = if steps_ahead == 0 {
                    z * model.residual_std
                } else {
                    z * model.residual_std * (steps_ahead as f64).sqrt()
                };

                EngineEstimate {
                    period,
                    estimate,
                    lower: estimate - spread,
                    upper: estimate + spread,
                }
            })
            .collect();

        self.fitted = Some(model);
        Ok(estimates)
    }

    fn render_component_breakdown(&self, forecast: &[ForecastPoint]) -> Result<ComponentBreakdown> {
        let model = self.fitted.as_ref().ok_or(PipelineError::NotFitted)?;

        let mut components = vec![ComponentSeries {
            name: "Trend".to_string(),
            values: forecast
                .iter()
                .map(|p| (p.period, model.trend_at(p.period.months_since(&model.start) as f64)))
                .collect(),
        }];

        if !model.seasonal.is_empty() {
            let name = if model.seasonal.len() == 12 {
                "Yearly Seasonality"
            } else {
                "Seasonality"
            };
            components.push(ComponentSeries {
                name: name.to_string(),
                values: forecast
                    .iter()
                    .map(|p| (p.period, model.seasonal_at(p.period)))
                    .collect(),
            });
        }

        Ok(ComponentBreakdown {
            engine: self.name().to_string(),
            components,
        })
    }
}

/// Position of `period` within a seasonal cycle of `len` months.
///
/// Cycles that divide a year line up with the calendar months. Any other
/// length counts from the first observed month.
fn seasonal_position(period: MonthPeriod, start: MonthPeriod, len: usize) -> usize {
    if 12 % len == 0 {
        (period.month() as usize - 1) % len
    } else {
        period.months_since(&start).rem_euclid(len as i64) as usize
    }
}

/// Upper bound on trend/seasonal refinement rounds.
const MAX_BACKFIT_ROUNDS: usize = 100;

/// Fit trend and seasonal factors jointly by alternating between them.
///
/// Returns `(intercept, slope, seasonal)`. Each round fits the trend on the
/// deseasonalized series, then recomputes the factors on the detrended one,
/// until the factors stop moving.
fn backfit(
    history: &[MonthlyObservation],
    points: &[(f64, f64)],
    period: usize,
    start: MonthPeriod,
) -> (f64, f64, Vec<f64>) {
    let mut seasonal = vec![0.0; period];
    let (mut intercept, mut slope) = least_squares(points);

    for round in 0..MAX_BACKFIT_ROUNDS {
        let next = seasonal_factors(history, period, |t| intercept + slope * t, start);
        let shift = next
            .iter()
            .zip(seasonal.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        seasonal = next;

        let deseasonalized: Vec<(f64, f64)> = history
            .iter()
            .zip(points.iter())
            .map(|(o, (t, y))| (*t, y - seasonal[seasonal_position(o.period, start, period)]))
            .collect();
        (intercept, slope) = least_squares(&deseasonalized);

        if shift < 1e-9 {
            debug!("Backfit settled after {} rounds", round + 1);
            break;
        }
    }

    (intercept, slope, seasonal)
}

/// Ordinary least squares fit. Returns `(intercept, slope)`.
fn least_squares(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let sum_t: f64 = points.iter().map(|(t, _)| t).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_t2: f64 = points.iter().map(|(t, _)| t * t).sum();
    let sum_ty: f64 = points.iter().map(|(t, y)| t * y).sum();

    let denominator = n * sum_t2 - sum_t * sum_t;
    if denominator.abs() < 1e-10 {
        return (sum_y / n, 0.0);
    }

    let slope = (n * sum_ty - sum_t * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_t) / n;
    (intercept, slope)
}

/// Mean detrended value per seasonal position, centred to sum to zero.
fn seasonal_factors(
    history: &[MonthlyObservation],
    period: usize,
    trend: impl Fn(f64) -> f64,
    start: MonthPeriod,
) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];

    for obs in history {
        let t = obs.period.months_since(&start) as f64;
        let pos = seasonal_position(obs.period, start, period);
        sums[pos] += obs.total - trend(t);
        counts[pos] += 1;
    }

    let raw: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
        .collect();

    let mean = raw.iter().sum::<f64>() / period as f64;
    raw.iter().map(|f| f - mean).collect()
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Approximate two-sided z-score for a confidence level.
fn z_score(confidence_level: f64) -> f64 {
    match confidence_level {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.282,
        _ => 1.96,
    }
}
