//! Monthly aggregation of transaction rows.
//!
//! Drops unusable rows and collapses the rest into a contiguous,
//! chronologically ordered monthly series.

use crate::error::{PipelineError, Result};
use crate::models::{MonthPeriod, MonthlyObservation, RawTransaction};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of aggregating a transaction log.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    /// Monthly totals, strictly ascending by period.
    pub observations: Vec<MonthlyObservation>,
    /// Rows that contributed to a total.
    pub kept_rows: usize,
    /// Rows dropped for a missing or invalid date or amount.
    pub dropped_rows: usize,
}

/// Rows with both a valid date and a valid amount, in input order.
pub fn valid_records(records: &[RawTransaction]) -> Vec<&RawTransaction> {
    records
        .iter()
        .filter(|r| r.valid_parts().is_some())
        .collect()
}

/// Group valid rows by calendar month and sum their amounts.
///
/// Months between the first and last observed month with no rows are
/// emitted with a zero total. Fails with [`PipelineError::NoValidData`] when
/// no row survives cleaning.
pub fn aggregate(records: &[RawTransaction]) -> Result<AggregateOutcome> {
    let mut totals: BTreeMap<MonthPeriod, f64> = BTreeMap::new();
    let mut kept_rows = 0;

    for record in records {
        match record.valid_parts() {
            Some((date, amount)) => {
                *totals.entry(MonthPeriod::from_date(date)).or_insert(0.0) += amount;
                kept_rows += 1;
            }
            None => debug!("Dropping row {}", record.line_number),
        }
    }

    let dropped_rows = records.len() - kept_rows;
    if dropped_rows > 0 {
        warn!(
            "Dropped {} of {} rows with a missing or invalid date or amount",
            dropped_rows,
            records.len()
        );
    }

    let (first, last) = match (totals.keys().next(), totals.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(PipelineError::NoValidData),
    };

    let mut observations = Vec::with_capacity(totals.len());
    let mut period = first;
    while period <= last {
        observations.push(MonthlyObservation {
            period,
            total: totals.get(&period).copied().unwrap_or(0.0),
        });
        period = period.succ();
    }

    debug!(
        "Aggregated {} rows into {} months ({} to {})",
        kept_rows,
        observations.len(),
        first,
        last
    );

    Ok(AggregateOutcome {
        observations,
        kept_rows,
        dropped_rows,
    })
}
