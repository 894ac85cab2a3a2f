//! Shared primitive types used across the pipeline.

/// Customer primary key in the store.
pub type CustomerId = i64;

/// Account primary key in the store.
pub type AccountId = i64;

/// Transaction primary key; unique across the feed.
pub type TransactionId = i64;

/// Identifies one job instance. Re-running with the same key resumes it.
pub type JobKey = String;

/// Textual timestamp layout used in the store. Lexicographic order is
/// chronological order.
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout for `account.last_statement_date`.
pub const STORE_DATE_FORMAT: &str = "%Y-%m-%d";
