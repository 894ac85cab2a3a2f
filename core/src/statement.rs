//! Statement documents: customer + accounts, rebuilt from a flat join.

use crate::{
    config::StatementConfig,
    transaction::Transaction,
    types::{AccountId, CustomerId, TransactionId, STORE_DATE_FORMAT, STORE_TIMESTAMP_FORMAT},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub customer_id:             CustomerId,
    pub first_name:              Option<String>,
    pub middle_name:             Option<String>,
    pub last_name:               Option<String>,
    pub address1:                Option<String>,
    pub address2:                Option<String>,
    pub city:                    Option<String>,
    pub state:                   Option<String>,
    pub postal_code:             Option<String>,
    pub ssn:                     Option<String>,
    pub email_address:           Option<String>,
    pub home_phone:              Option<String>,
    pub cell_phone:              Option<String>,
    pub work_phone:              Option<String>,
    pub notification_preference: Option<i64>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub account_id:          AccountId,
    pub balance:             Decimal,
    pub last_statement_date: Option<NaiveDate>,
    /// Timestamp ascending. Only populated during statement assembly.
    pub transactions:        Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub customer: Customer,
    pub accounts: Vec<Account>,
}

/// One row of the account LEFT JOIN transaction query. Transaction columns
/// are all `None` for an account without transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRow {
    pub account_id:          AccountId,
    pub balance:             Decimal,
    pub last_statement_date: Option<NaiveDate>,
    pub transaction_id:      Option<TransactionId>,
    pub description:         Option<String>,
    pub credit:              Option<Decimal>,
    pub debit:               Option<Decimal>,
    pub timestamp:           Option<NaiveDateTime>,
}

impl StatementRow {
    fn open_account(&self) -> Account {
        Account {
            account_id:          self.account_id,
            balance:             self.balance,
            last_statement_date: self.last_statement_date,
            transactions:        Vec::new(),
        }
    }

    fn transaction(&self) -> Option<Transaction> {
        let (transaction_id, timestamp) = (self.transaction_id?, self.timestamp?);
        Some(Transaction {
            transaction_id,
            account_id: self.account_id,
            description: self.description.clone().unwrap_or_default(),
            credit: self.credit,
            debit: self.debit,
            timestamp,
        })
    }
}

/// Accumulator for the account fold.
#[derive(Debug, Default)]
struct AccountFold {
    current:  Option<Account>,
    finished: Vec<Account>,
}

impl AccountFold {
    fn push(mut self, row: StatementRow) -> Self {
        let switch = self
            .current
            .as_ref()
            .map_or(true, |account| account.account_id != row.account_id);
        if switch {
            self.finished.extend(self.current.take());
            self.current = Some(row.open_account());
        }
        if let (Some(account), Some(txn)) = (self.current.as_mut(), row.transaction()) {
            account.transactions.push(txn);
        }
        self
    }

    fn finish(mut self) -> Vec<Account> {
        self.finished.extend(self.current.take());
        self.finished
    }
}

/// Rebuild the account -> transactions hierarchy from rows sorted by
/// account id then timestamp. One `Account` per run of equal account ids,
/// transactions kept in row order.
pub fn assemble_accounts<I>(rows: I) -> Vec<Account>
where
    I: IntoIterator<Item = StatementRow>,
{
    rows.into_iter()
        .fold(AccountFold::default(), AccountFold::push)
        .finish()
}

/// Text layout for one statement artifact.
#[derive(Debug, Clone)]
pub struct StatementRenderer {
    header_lines: Vec<String>,
    width:        usize,
}

impl StatementRenderer {
    pub fn new(config: &StatementConfig) -> Self {
        Self {
            header_lines: config.header_lines.clone(),
            width:        config.header_width,
        }
    }

    pub fn header(&self) -> String {
        let mut out = String::new();
        for line in &self.header_lines {
            let _ = writeln!(out, "{line:>width$}", width = self.width);
        }
        out.push('\n');
        out
    }

    pub fn render(&self, statement: &Statement) -> String {
        let mut out = self.header();
        let customer = &statement.customer;

        let _ = writeln!(out, "{}", customer.full_name());
        for line in [&customer.address1, &customer.address2].into_iter().flatten() {
            let _ = writeln!(out, "{line}");
        }
        let city     = customer.city.as_deref().unwrap_or_default();
        let state    = customer.state.as_deref().unwrap_or_default();
        let postal   = customer.postal_code.as_deref().unwrap_or_default();
        let _ = writeln!(out, "{city}, {state} {postal}");
        out.push('\n');

        if statement.accounts.is_empty() {
            let _ = writeln!(out, "No accounts on file.");
        }

        for account in &statement.accounts {
            let last = account
                .last_statement_date
                .map(|d| d.format(STORE_DATE_FORMAT).to_string())
                .unwrap_or_else(|| "never".into());
            let _ = writeln!(out, "Account Number: {}", account.account_id);
            let _ = writeln!(out, "Balance:        {:.2}", account.balance);
            let _ = writeln!(out, "Last Statement: {last}");
            out.push('\n');

            let mut total = Decimal::ZERO;
            for txn in &account.transactions {
                let amount = txn.transaction_amount();
                total += amount;
                let _ = writeln!(
                    out,
                    "  {}  {:<60} {:>14.2}",
                    txn.timestamp.format(STORE_TIMESTAMP_FORMAT),
                    txn.description,
                    amount
                );
            }
            if account.transactions.is_empty() {
                let _ = writeln!(out, "  No transactions.");
            }
            let _ = writeln!(out, "  {:<81} {:>14.2}", "Net activity", total);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, STORE_TIMESTAMP_FORMAT).unwrap()
    }

    fn shell(account_id: AccountId, balance: Decimal) -> StatementRow {
        StatementRow {
            account_id,
            balance,
            last_statement_date: None,
            transaction_id: None,
            description: None,
            credit: None,
            debit: None,
            timestamp: None,
        }
    }

    fn with_txn(account_id: AccountId, id: TransactionId, credit: Decimal, at: &str) -> StatementRow {
        StatementRow {
            transaction_id: Some(id),
            description: Some(format!("txn {id}")),
            credit: Some(credit),
            timestamp: Some(ts(at)),
            ..shell(account_id, dec!(50.00))
        }
    }

    fn customer() -> Customer {
        Customer {
            customer_id: 42,
            first_name: Some("Jane".into()),
            middle_name: None,
            last_name: Some("Doe".into()),
            address1: Some("1 Main St".into()),
            address2: None,
            city: Some("Columbus".into()),
            state: Some("OH".into()),
            postal_code: Some("43004".into()),
            ssn: Some("000-00-0000".into()),
            email_address: None,
            home_phone: None,
            cell_phone: None,
            work_phone: None,
            notification_preference: Some(1),
        }
    }

    #[test]
    fn rebuilds_accounts_without_phantom_transactions() {
        let rows = vec![
            with_txn(1, 10, dec!(5.00), "2026-01-01 10:00:00"),
            with_txn(1, 11, dec!(7.00), "2026-01-02 10:00:00"),
            shell(2, dec!(0.00)),
        ];
        let accounts = assemble_accounts(rows);

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].account_id, 1);
        let ids: Vec<_> = accounts[0].transactions.iter().map(|t| t.transaction_id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert_eq!(accounts[1].account_id, 2);
        assert!(accounts[1].transactions.is_empty());
    }

    #[test]
    fn empty_rows_give_no_accounts() {
        assert!(assemble_accounts(Vec::new()).is_empty());
    }

    #[test]
    fn single_shell_row_gives_one_empty_account() {
        let accounts = assemble_accounts(vec![shell(9, dec!(12.34))]);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, dec!(12.34));
        assert!(accounts[0].transactions.is_empty());
    }

    #[test]
    fn full_name_skips_absent_parts() {
        assert_eq!(customer().full_name(), "Jane Doe");
    }

    #[test]
    fn render_puts_header_first_and_lists_transactions() {
        let renderer = StatementRenderer::new(&StatementConfig::default());
        let statement = Statement {
            customer: customer(),
            accounts: assemble_accounts(vec![
                with_txn(1, 10, dec!(5.00), "2026-01-01 10:00:00"),
                with_txn(1, 11, dec!(-2.50), "2026-01-02 10:00:00"),
            ]),
        };
        let text = renderer.render(&statement);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0].len(), 120);
        assert!(lines[0].ends_with("Statement Batch Services"));
        assert!(lines[2].ends_with("Available 24/7"));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Jane Doe");

        let first  = text.find("txn 10").unwrap();
        let second = text.find("txn 11").unwrap();
        assert!(first < second);
        assert!(text.contains("Account Number: 1"));
        assert!(text.contains("2.50"));
    }
}
