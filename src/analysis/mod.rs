//! Analysis modules.
//!
//! Monthly aggregation of the raw log and insight derivation over the
//! series and its forecast.

pub mod aggregator;
pub mod insights;

pub use aggregator::{aggregate, valid_records, AggregateOutcome};
pub use insights::summarize;
