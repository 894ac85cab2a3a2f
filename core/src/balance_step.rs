//! Step 3: apply pending transactions to account balances.
//!
//! Transactions are read in (timestamp, transaction_id) order and each one
//! is applied at most once: the `applied` marker is set in the same chunk
//! transaction as the balance change. A transaction whose account row does
//! not exist is a no-op and stays pending for a later run.

use crate::{
    error::BatchResult,
    step::{ChunkStep, ItemReader, ItemWriter, PassThrough},
    store::{BatchStore, StepExecution},
    transaction::Transaction,
    types::TransactionId,
};
use chrono::NaiveDateTime;
use std::collections::VecDeque;

pub const STEP_NAME: &str = "applyTransactions";

const PAGE_SIZE: usize = 500;

pub type BalanceStep = ChunkStep<PendingTransactionReader, PassThrough<Transaction>, BalanceWriter>;

pub fn build(chunk_size: usize) -> BalanceStep {
    ChunkStep::new(
        STEP_NAME,
        chunk_size,
        PendingTransactionReader::default(),
        PassThrough::default(),
        BalanceWriter,
    )
}

/// Keyset-paged cursor over unapplied transactions.
#[derive(Default)]
pub struct PendingTransactionReader {
    buffer:    VecDeque<Transaction>,
    after:     Option<(NaiveDateTime, TransactionId)>,
    exhausted: bool,
}

impl ItemReader for PendingTransactionReader {
    type Item = Transaction;

    fn open(&mut self, _store: &BatchStore, _checkpoint: &StepExecution) -> BatchResult<()> {
        // The applied marker is the resume position.
        self.buffer.clear();
        self.after = None;
        self.exhausted = false;
        Ok(())
    }

    fn read(&mut self, store: &BatchStore) -> BatchResult<Option<Transaction>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = store.unapplied_transactions(self.after, PAGE_SIZE)?;
            match page.last() {
                Some(last) => self.after = Some((last.timestamp, last.transaction_id)),
                None => self.exhausted = true,
            }
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }
}

pub struct BalanceWriter;

impl ItemWriter for BalanceWriter {
    type Item = Transaction;

    fn write(&mut self, store: &BatchStore, items: Vec<Transaction>) -> BatchResult<u64> {
        let mut applied = Vec::with_capacity(items.len());
        for txn in &items {
            let amount = txn.transaction_amount();
            if store.add_to_balance(txn.account_id, amount)? == 0 {
                log::warn!(
                    "step={STEP_NAME} account {} not found; transaction {} left pending",
                    txn.account_id,
                    txn.transaction_id
                );
                continue;
            }
            applied.push(txn.transaction_id);
        }
        store.mark_transactions_applied(&applied)?;
        Ok(applied.len() as u64)
    }
}
