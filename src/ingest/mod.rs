//! Input ingestion.
//!
//! This module turns the raw sales log on disk into transaction rows.

pub mod reader;

pub use reader::{read_transactions, ReadOptions, TransactionLog};
