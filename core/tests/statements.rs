//! Integration tests for statement generation, run through the full job.

mod common;

use common::{feed, seed_account, seed_customer, store, txn_json, Workspace, EMPTY_FEED};
use rust_decimal_macros::dec;
use statement_batch_core::{
    engine::BatchJob,
    statement::{assemble_accounts, StatementRenderer},
    statement_step,
};

#[test]
fn statement_lists_each_account_with_its_transactions() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 1);
    seed_account(&store, 1, 11, dec!(0));
    seed_account(&store, 1, 12, dec!(75.00));

    let json = feed(&[
        txn_json(2, 11, "null", r#""-20.00""#, "2026-03-02 09:30:00"),
        txn_json(1, 11, r#""100.00""#, "null", "2026-03-01 08:00:00"),
    ]);
    let inputs = ws.inputs("", &json);
    BatchJob::build(&ws.config(), &inputs).run(&store, "statement-run").unwrap();

    let accounts = assemble_accounts(store.statement_rows(1).unwrap());
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].account_id, 11);
    assert_eq!(accounts[0].balance, dec!(80.00));
    let ids: Vec<i64> = accounts[0].transactions.iter().map(|t| t.transaction_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(accounts[1].account_id, 12);
    assert!(accounts[1].transactions.is_empty());

    let text = ws.statement(1);
    let header = StatementRenderer::new(&ws.config().statement).header();
    assert!(text.starts_with(&header));
    assert!(text.contains("Ann Marie Smith"));
    assert!(text.contains("Account Number: 11"));
    assert!(text.contains("Account Number: 12"));
    assert!(text.contains("Balance:        80.00"));
    assert!(text.contains("  No transactions."));

    let first = text.find("txn 1").unwrap();
    let second = text.find("txn 2").unwrap();
    assert!(first < second, "transactions out of timestamp order");
}

#[test]
fn customer_without_accounts_gets_a_statement() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 3);

    let inputs = ws.inputs("", EMPTY_FEED);
    BatchJob::build(&ws.config(), &inputs).run(&store, "no-accounts").unwrap();

    let text = ws.statement(3);
    assert!(text.contains("No accounts on file."));
    assert!(!text.contains("Account Number:"));
}

#[test]
fn one_file_per_customer() {
    let store = store();
    let ws = Workspace::new();
    for id in [1, 2, 3] {
        seed_customer(&store, id);
        seed_account(&store, id, 100 + id, dec!(5.00));
    }

    let inputs = ws.inputs("", EMPTY_FEED);
    let summary = BatchJob::build(&ws.config(), &inputs).run(&store, "per-customer").unwrap();

    let step = summary.step(statement_step::STEP_NAME).unwrap();
    assert_eq!(step.execution.read_count, 3);
    assert_eq!(step.execution.write_count, 3);
    // Default statement chunk size is one customer per commit.
    assert_eq!(step.execution.commit_count, 3);

    let files = std::fs::read_dir(ws.output_dir()).unwrap().count();
    assert_eq!(files, 3);
    for id in [1, 2, 3] {
        assert!(ws.statement(id).contains(&format!("Account Number: {}", 100 + id)));
    }
}

#[test]
fn statements_reflect_customer_updates_and_balances() {
    let store = store();
    let ws = Workspace::new();
    seed_customer(&store, 42);
    seed_account(&store, 42, 7, dec!(50.00));

    let json = feed(&[txn_json(1001, 7, r#""100.00""#, "null", "2026-03-01 10:00:00")]);
    let inputs = ws.inputs("1,42,Jane,,Doe\n", &json);
    BatchJob::build(&ws.config(), &inputs).run(&store, "end-to-end").unwrap();

    let text = ws.statement(42);
    assert!(text.contains("Jane Marie Doe"));
    assert!(text.contains("Balance:        150.00"));
    assert!(text.contains("txn 1001"));
}

#[test]
fn chunk_size_does_not_change_statement_content() {
    let mut outputs = Vec::new();
    for chunk in [1, 50] {
        let store = store();
        let ws = Workspace::new();
        for id in [1, 2] {
            seed_customer(&store, id);
            seed_account(&store, id, 10 * id, dec!(0));
            seed_account(&store, id, 10 * id + 1, dec!(0));
        }
        let json = feed(&[
            txn_json(1, 10, r#""1.00""#, "null", "2026-03-01 10:00:00"),
            txn_json(2, 11, r#""2.00""#, "null", "2026-03-01 10:00:00"),
            txn_json(3, 20, r#""3.00""#, "null", "2026-03-01 10:00:00"),
            txn_json(4, 21, r#""4.00""#, "null", "2026-03-01 10:00:00"),
        ]);
        let inputs = ws.inputs("", &json);
        let mut config = ws.config();
        config.chunk_sizes.statements = chunk;
        BatchJob::build(&config, &inputs).run(&store, "chunked").unwrap();
        outputs.push((ws.statement(1), ws.statement(2)));
    }
    assert_eq!(outputs[0], outputs[1]);
}
