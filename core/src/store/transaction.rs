use super::{decimal_value, opt_decimal, BatchStore};
use crate::{
    error::BatchResult,
    transaction::Transaction,
    types::{TransactionId, STORE_TIMESTAMP_FORMAT},
};
use chrono::NaiveDateTime;
use rusqlite::{params, types::Value, OptionalExtension};

const INSERT_TRANSACTION_SQL: &str = "INSERT INTO transactions
    (transaction_id, account_id, description, credit, debit, timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

impl BatchStore {
    // ── Transaction ───────────────────────────────────────────────

    /// Insert new rows. A duplicate `transaction_id` fails the whole call.
    pub fn insert_transactions(&self, txns: &[Transaction]) -> BatchResult<Vec<usize>> {
        let sets: Vec<Vec<Value>> = txns
            .iter()
            .map(|t| {
                vec![
                    t.transaction_id.into(),
                    t.account_id.into(),
                    t.description.clone().into(),
                    decimal_value(t.credit),
                    decimal_value(t.debit),
                    Value::Text(t.timestamp.format(STORE_TIMESTAMP_FORMAT).to_string()),
                ]
            })
            .collect();
        self.execute_many(INSERT_TRANSACTION_SQL, &sets)
    }

    /// Next page of not-yet-applied transactions in (timestamp, id) order,
    /// strictly after `after` when given.
    pub fn unapplied_transactions(
        &self,
        after: Option<(NaiveDateTime, TransactionId)>,
        limit: usize,
    ) -> BatchResult<Vec<Transaction>> {
        let (after_ts, after_id) = match after {
            Some((ts, id)) => (
                Some(ts.format(STORE_TIMESTAMP_FORMAT).to_string()),
                Some(id),
            ),
            None => (None, None),
        };
        self.query_rows(
            "SELECT transaction_id, account_id, description, credit, debit, timestamp
             FROM transactions
             WHERE applied = 0
               AND (?1 IS NULL OR (timestamp, transaction_id) > (?1, ?2))
             ORDER BY timestamp, transaction_id
             LIMIT ?3",
            params![after_ts, after_id, limit as i64],
            |row| {
                Ok(Transaction {
                    transaction_id: row.get(0)?,
                    account_id:     row.get(1)?,
                    description:    row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    credit:         opt_decimal(row, 3)?,
                    debit:          opt_decimal(row, 4)?,
                    timestamp:      row.get(5)?,
                })
            },
        )
    }

    pub fn mark_transactions_applied(&self, ids: &[TransactionId]) -> BatchResult<Vec<usize>> {
        let sets: Vec<Vec<Value>> = ids.iter().map(|id| vec![(*id).into()]).collect();
        self.execute_many(
            "UPDATE transactions SET applied = 1 WHERE transaction_id = ?1",
            &sets,
        )
    }

    pub fn transaction_count(&self) -> BatchResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// `None` when the transaction does not exist.
    pub fn transaction_applied(&self, transaction_id: TransactionId) -> BatchResult<Option<bool>> {
        let applied = self
            .conn
            .query_row(
                "SELECT applied FROM transactions WHERE transaction_id = ?1",
                params![transaction_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(applied.map(|flag| flag != 0))
    }
}
