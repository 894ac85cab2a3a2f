use super::{decimal, opt_decimal, BatchStore};
use crate::{
    error::BatchResult,
    statement::StatementRow,
    types::{AccountId, CustomerId},
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;

impl BatchStore {
    // ── Account ───────────────────────────────────────────────────

    /// Provisioning insert. The pipeline never creates accounts.
    pub fn insert_account(
        &self,
        account_id: AccountId,
        balance: Decimal,
        last_statement_date: Option<NaiveDate>,
    ) -> BatchResult<()> {
        self.conn.execute(
            "INSERT INTO account (account_id, balance, last_statement_date) VALUES (?1, ?2, ?3)",
            params![account_id, balance.to_string(), last_statement_date],
        )?;
        Ok(())
    }

    pub fn link_customer_account(
        &self,
        customer_id: CustomerId,
        account_id: AccountId,
    ) -> BatchResult<()> {
        self.conn.execute(
            "INSERT INTO customer_account (customer_id, account_id) VALUES (?1, ?2)",
            params![customer_id, account_id],
        )?;
        Ok(())
    }

    pub fn account_balance(&self, account_id: AccountId) -> BatchResult<Option<Decimal>> {
        let balance = self
            .conn
            .query_row(
                "SELECT balance FROM account WHERE account_id = ?1",
                params![account_id],
                |row| decimal(row, 0),
            )
            .optional()?;
        Ok(balance)
    }

    /// `balance := balance + amount`. Returns rows affected; 0 when the
    /// account does not exist.
    pub fn add_to_balance(&self, account_id: AccountId, amount: Decimal) -> BatchResult<usize> {
        // SQLite arithmetic on TEXT goes through REAL, so the sum is done
        // in Decimal. Callers hold the chunk transaction.
        let Some(balance) = self.account_balance(account_id)? else {
            return Ok(0);
        };
        let updated = self.conn.execute(
            "UPDATE account SET balance = ?1 WHERE account_id = ?2",
            params![(balance + amount).to_string(), account_id],
        )?;
        Ok(updated)
    }

    /// Accounts owned by `customer_id` left-joined with their transactions,
    /// ordered by account then timestamp.
    pub fn statement_rows(&self, customer_id: CustomerId) -> BatchResult<Vec<StatementRow>> {
        self.query_rows(
            "SELECT a.account_id, a.balance, a.last_statement_date,
                    t.transaction_id, t.description, t.credit, t.debit, t.timestamp
             FROM account a
             LEFT JOIN transactions t ON a.account_id = t.account_id
             WHERE a.account_id IN (
                 SELECT account_id FROM customer_account WHERE customer_id = ?1
             )
             ORDER BY a.account_id, t.timestamp, t.transaction_id",
            params![customer_id],
            |row| {
                Ok(StatementRow {
                    account_id:          row.get(0)?,
                    balance:             decimal(row, 1)?,
                    last_statement_date: row.get(2)?,
                    transaction_id:      row.get(3)?,
                    description:         row.get(4)?,
                    credit:              opt_decimal(row, 5)?,
                    debit:               opt_decimal(row, 6)?,
                    timestamp:           row.get(7)?,
                })
            },
        )
    }
}
