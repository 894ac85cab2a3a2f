#![allow(dead_code)]

use rust_decimal::Decimal;
use statement_batch_core::{
    config::BatchConfig, engine::JobInputs, statement::Customer, store::BatchStore,
};
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Route `log` output through the test harness. `RUST_LOG=debug` shows
/// per-chunk commits.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fresh migrated in-memory store.
pub fn store() -> BatchStore {
    init_logging();
    let store = BatchStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

pub fn customer(customer_id: i64) -> Customer {
    Customer {
        customer_id,
        first_name: Some("Ann".into()),
        middle_name: Some("Marie".into()),
        last_name: Some("Smith".into()),
        address1: Some("10 Oak Ave".into()),
        address2: Some("Unit 2".into()),
        city: Some("Dayton".into()),
        state: Some("OH".into()),
        postal_code: Some("45402".into()),
        ssn: Some("123-45-6789".into()),
        email_address: Some("ann@example.com".into()),
        home_phone: Some("555-0001".into()),
        cell_phone: Some("555-0002".into()),
        work_phone: Some("555-0003".into()),
        notification_preference: Some(1),
    }
}

pub fn seed_customer(store: &BatchStore, customer_id: i64) -> Customer {
    let c = customer(customer_id);
    store.insert_customer(&c).expect("insert customer");
    c
}

pub fn seed_account(store: &BatchStore, customer_id: i64, account_id: i64, balance: Decimal) {
    store
        .insert_account(account_id, balance, None)
        .expect("insert account");
    store
        .link_customer_account(customer_id, account_id)
        .expect("link account");
}

/// Temp directory holding feed files and statement output.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("write feed");
        path
    }

    pub fn inputs(&self, updates: &str, transactions: &str) -> JobInputs {
        JobInputs {
            customer_updates: self.write("customer_updates.csv", updates),
            transactions:     self.write("transactions.json", transactions),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("statements")
    }

    /// Default config writing statements into this workspace.
    pub fn config(&self) -> BatchConfig {
        let mut config = BatchConfig::default();
        config.statement.output_dir = self.output_dir().display().to_string();
        config
    }

    pub fn statement(&self, customer_id: i64) -> String {
        fs::read_to_string(self.output_dir().join(format!("statement_{customer_id}.txt")))
            .expect("statement file")
    }
}

pub const EMPTY_FEED: &str = r#"{ "transactions": [] }"#;

/// JSON fragment for one transaction. `credit`/`debit` are raw JSON values.
pub fn txn_json(id: i64, account_id: i64, credit: &str, debit: &str, timestamp: &str) -> String {
    format!(
        r#"{{ "transactionId": {id}, "accountId": {account_id}, "description": "txn {id}",
             "credit": {credit}, "debit": {debit}, "timestamp": "{timestamp}" }}"#
    )
}

pub fn feed(fragments: &[String]) -> String {
    format!(r#"{{ "transactions": [ {} ] }}"#, fragments.join(", "))
}
