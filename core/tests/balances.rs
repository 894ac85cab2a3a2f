//! Integration tests for transaction ingestion and balance application:
//! 1. The feed lands in the store unmodified
//! 2. Duplicate transaction ids fail the step loudly
//! 3. Each transaction changes its balance exactly once, across re-runs
//!    under the same key and under a new key
//! 4. Transactions against a missing account stay pending
//! 5. The final balance does not depend on feed order

mod common;

use common::{feed, seed_account, seed_customer, store, txn_json, Workspace};
use rust_decimal_macros::dec;
use statement_batch_core::{
    balance_step,
    engine::{BatchJob, JobSummary},
    error::{BatchError, BatchResult},
    store::BatchStore,
    transaction_import_step,
    types::STORE_TIMESTAMP_FORMAT,
};

fn import_and_apply(store: &BatchStore, ws: &Workspace, json: &str, key: &str) -> BatchResult<JobSummary> {
    let path = ws.write("transactions.json", json);
    let mut job = BatchJob::new();
    job.register(Box::new(transaction_import_step::build(path, STORE_TIMESTAMP_FORMAT, 100)));
    job.register(Box::new(balance_step::build(100)));
    job.run(store, key)
}

fn apply_only(store: &BatchStore, key: &str) -> BatchResult<JobSummary> {
    let mut job = BatchJob::new();
    job.register(Box::new(balance_step::build(100)));
    job.run(store, key)
}

#[test]
fn credit_is_applied_to_balance() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 1);
    seed_account(&store, 1, 7, dec!(50.00));

    let json = feed(&[txn_json(1001, 7, r#""100.00""#, "null", "2026-03-01 10:00:00")]);
    let summary = import_and_apply(&store, &ws, &json, "run-1").unwrap();

    assert_eq!(store.account_balance(7).unwrap(), Some(dec!(150.00)));
    assert_eq!(store.transaction_count().unwrap(), 1);
    assert_eq!(store.transaction_applied(1001).unwrap(), Some(true));

    let applied = summary.step(balance_step::STEP_NAME).unwrap();
    assert_eq!(applied.execution.read_count, 1);
    assert_eq!(applied.execution.write_count, 1);
}

#[test]
fn credit_and_debit_sum_into_one_delta() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 1);
    seed_account(&store, 1, 7, dec!(10.00));

    let json = feed(&[
        txn_json(1, 7, r#""25.50""#, r#""-5.25""#, "2026-03-01 10:00:00"),
        txn_json(2, 7, "null", r#""-0.25""#, "2026-03-02 10:00:00"),
        txn_json(3, 7, "null", "null", "2026-03-03 10:00:00"),
    ]);
    import_and_apply(&store, &ws, &json, "run-1").unwrap();

    assert_eq!(store.account_balance(7).unwrap(), Some(dec!(30.00)));
}

#[test]
fn duplicate_transaction_id_fails_loudly() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 1);
    seed_account(&store, 1, 7, dec!(0));

    let json = feed(&[
        txn_json(5, 7, r#""1.00""#, "null", "2026-03-01 10:00:00"),
        txn_json(5, 7, r#""2.00""#, "null", "2026-03-01 11:00:00"),
    ]);
    let err = import_and_apply(&store, &ws, &json, "run-1").unwrap_err();

    match err {
        BatchError::StepFailed { step, source, .. } => {
            assert_eq!(step, transaction_import_step::STEP_NAME);
            assert!(matches!(*source, BatchError::Database(_)));
        }
        other => panic!("expected StepFailed, got {other:?}"),
    }
    // The whole chunk rolled back; nothing was applied.
    assert_eq!(store.transaction_count().unwrap(), 0);
    assert_eq!(store.account_balance(7).unwrap(), Some(dec!(0)));
}

#[test]
fn rerun_with_same_key_does_not_reapply() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 1);
    seed_account(&store, 1, 7, dec!(50.00));

    let json = feed(&[txn_json(1001, 7, r#""100.00""#, "null", "2026-03-01 10:00:00")]);
    import_and_apply(&store, &ws, &json, "run-1").unwrap();
    let again = import_and_apply(&store, &ws, &json, "run-1").unwrap();

    assert!(again.steps.iter().all(|s| s.skipped_as_complete));
    assert_eq!(store.account_balance(7).unwrap(), Some(dec!(150.00)));
}

#[test]
fn apply_under_new_key_skips_applied_transactions() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 1);
    seed_account(&store, 1, 7, dec!(50.00));

    let json = feed(&[txn_json(1001, 7, r#""100.00""#, "null", "2026-03-01 10:00:00")]);
    import_and_apply(&store, &ws, &json, "run-1").unwrap();

    let summary = apply_only(&store, "run-2").unwrap();
    let step = summary.step(balance_step::STEP_NAME).unwrap();
    assert!(!step.skipped_as_complete);
    assert_eq!(step.execution.read_count, 0);
    assert_eq!(store.account_balance(7).unwrap(), Some(dec!(150.00)));
}

#[test]
fn missing_account_leaves_transaction_pending() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 1);
    seed_account(&store, 1, 7, dec!(0));

    let json = feed(&[
        txn_json(1, 404, r#""9.99""#, "null", "2026-03-01 10:00:00"),
        txn_json(2, 7, r#""1.00""#, "null", "2026-03-01 11:00:00"),
    ]);
    let summary = import_and_apply(&store, &ws, &json, "run-1").unwrap();

    let step = summary.step(balance_step::STEP_NAME).unwrap();
    assert_eq!(step.execution.read_count, 2);
    assert_eq!(step.execution.write_count, 1);
    assert_eq!(store.transaction_applied(1).unwrap(), Some(false));
    assert_eq!(store.transaction_applied(2).unwrap(), Some(true));
    assert_eq!(store.account_balance(404).unwrap(), None);
    assert_eq!(store.account_balance(7).unwrap(), Some(dec!(1.00)));

    // Once the account is provisioned a later run applies it.
    seed_account(&store, 1, 404, dec!(0));
    apply_only(&store, "run-2").unwrap();
    assert_eq!(store.transaction_applied(1).unwrap(), Some(true));
    assert_eq!(store.account_balance(404).unwrap(), Some(dec!(9.99)));
    assert_eq!(store.account_balance(7).unwrap(), Some(dec!(1.00)));
}

#[test]
fn final_balance_is_order_insensitive() {
    let txns = [
        txn_json(1, 7, r#""100.00""#, "null", "2026-03-01 10:00:00"),
        txn_json(2, 7, "null", r#""-30.10""#, "2026-03-02 10:00:00"),
        txn_json(3, 7, r#""0.35""#, r#""-1.00""#, "2026-03-03 10:00:00"),
    ];
    let reversed: Vec<String> = txns.iter().rev().cloned().collect();

    let mut balances = Vec::new();
    for order in [txns.to_vec(), reversed] {
        let store = store();
        let ws = Workspace::new();
        seed_customer(&store, 1);
        seed_account(&store, 1, 7, dec!(20.00));
        import_and_apply(&store, &ws, &feed(&order), "run-1").unwrap();
        balances.push(store.account_balance(7).unwrap());
    }

    assert_eq!(balances[0], Some(dec!(89.25)));
    assert_eq!(balances[0], balances[1]);
}

#[test]
fn bad_timestamp_aborts_ingestion() {
    let store = store();
    let ws = Workspace::new();

    let json = feed(&[
        txn_json(1, 7, r#""1.00""#, "null", "2026-03-01 10:00:00"),
        txn_json(2, 7, r#""1.00""#, "null", "03/01/2026"),
    ]);
    let err = import_and_apply(&store, &ws, &json, "run-1").unwrap_err();
    let BatchError::StepFailed { source, .. } = err else {
        panic!("expected StepFailed");
    };
    assert!(matches!(*source, BatchError::FormatError { record: 2, field: "timestamp", .. }));
    assert_eq!(store.transaction_count().unwrap(), 0);
}
