//! Output persistence.
//!
//! Derived tables, the report artifact, and the execution log.

pub mod writer;

pub use writer::{append_run_log, render_cleaned_csv, render_monthly_csv, write_all_atomic};
