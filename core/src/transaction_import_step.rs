//! Step 2: ingest the transaction feed unmodified.

use crate::{
    error::{BatchError, BatchResult},
    step::{ChunkStep, ItemReader, ItemWriter, PassThrough},
    store::{BatchStore, StepExecution},
    transaction::{Transaction, TransactionFeed},
};
use std::path::PathBuf;

pub const STEP_NAME: &str = "importTransactions";

pub type TransactionImportStep =
    ChunkStep<TransactionFeedReader, PassThrough<Transaction>, TransactionInsertWriter>;

pub fn build(
    input: impl Into<PathBuf>,
    timestamp_format: &str,
    chunk_size: usize,
) -> TransactionImportStep {
    ChunkStep::new(
        STEP_NAME,
        chunk_size,
        TransactionFeedReader::new(input, timestamp_format),
        PassThrough::default(),
        TransactionInsertWriter,
    )
}

pub struct TransactionFeedReader {
    path:             PathBuf,
    timestamp_format: String,
    feed:             Option<TransactionFeed>,
}

impl TransactionFeedReader {
    pub fn new(path: impl Into<PathBuf>, timestamp_format: &str) -> Self {
        Self {
            path:             path.into(),
            timestamp_format: timestamp_format.to_string(),
            feed:             None,
        }
    }
}

impl ItemReader for TransactionFeedReader {
    type Item = Transaction;

    fn open(&mut self, _store: &BatchStore, checkpoint: &StepExecution) -> BatchResult<()> {
        let mut feed = TransactionFeed::open(&self.path, &self.timestamp_format)?;
        while feed.position() < checkpoint.read_count {
            if feed.next_transaction()?.is_none() {
                break;
            }
        }
        if feed.position() > 0 {
            log::info!(
                "step={STEP_NAME} resuming {} after {} fragments",
                self.path.display(),
                feed.position()
            );
        }
        self.feed = Some(feed);
        Ok(())
    }

    fn read(&mut self, _store: &BatchStore) -> BatchResult<Option<Transaction>> {
        match self.feed.as_mut() {
            Some(feed) => feed.next_transaction(),
            None => Err(BatchError::Other(anyhow::anyhow!(
                "transaction feed reader read before open"
            ))),
        }
    }
}

/// Inserts each transaction as a new row. Duplicate ids fail the chunk.
pub struct TransactionInsertWriter;

impl ItemWriter for TransactionInsertWriter {
    type Item = Transaction;

    fn write(&mut self, store: &BatchStore, items: Vec<Transaction>) -> BatchResult<u64> {
        Ok(store.insert_transactions(&items)?.len() as u64)
    }
}
