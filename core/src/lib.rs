//! Statement batch: customer updates, transaction ingestion, balance
//! application and per-customer statements, run as chunked steps over a
//! SQLite store.

pub mod balance_step;
pub mod config;
pub mod customer_update;
pub mod customer_update_step;
pub mod engine;
pub mod error;
pub mod statement;
pub mod statement_step;
pub mod step;
pub mod store;
pub mod transaction;
pub mod transaction_import_step;
pub mod types;

pub use config::BatchConfig;
pub use engine::{BatchJob, JobInputs, JobSummary, StepSummary};
pub use error::{BatchError, BatchResult};
pub use store::BatchStore;
