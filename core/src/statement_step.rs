//! Step 4: assemble and emit one statement per customer.

use crate::{
    config::StatementConfig,
    error::BatchResult,
    statement::{assemble_accounts, Customer, Statement, StatementRenderer},
    step::{ChunkStep, ItemProcessor, ItemReader, ItemWriter},
    store::{BatchStore, StepExecution},
};
use std::{collections::VecDeque, fs, path::PathBuf};

pub const STEP_NAME: &str = "generateStatements";

const PAGE_SIZE: usize = 100;

pub type StatementStep = ChunkStep<CustomerReader, AccountAssembler, StatementFileWriter>;

pub fn build(config: &StatementConfig, chunk_size: usize) -> StatementStep {
    ChunkStep::new(
        STEP_NAME,
        chunk_size,
        CustomerReader::default(),
        AccountAssembler,
        StatementFileWriter::new(config),
    )
}

/// Full scan of the customer table in id order, paged by offset.
#[derive(Default)]
pub struct CustomerReader {
    buffer:    VecDeque<Customer>,
    offset:    u64,
    exhausted: bool,
}

impl ItemReader for CustomerReader {
    type Item = Customer;

    fn open(&mut self, _store: &BatchStore, checkpoint: &StepExecution) -> BatchResult<()> {
        self.buffer.clear();
        self.offset = checkpoint.read_count;
        self.exhausted = false;
        if self.offset > 0 {
            log::info!("step={STEP_NAME} resuming after {} customers", self.offset);
        }
        Ok(())
    }

    fn read(&mut self, store: &BatchStore) -> BatchResult<Option<Customer>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = store.customers_page(self.offset, PAGE_SIZE)?;
            self.offset += page.len() as u64;
            self.exhausted = page.len() < PAGE_SIZE;
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }
}

/// Loads the customer's accounts and rebuilds their transaction lists.
pub struct AccountAssembler;

impl ItemProcessor for AccountAssembler {
    type Input = Customer;
    type Output = Statement;

    fn process(&mut self, store: &BatchStore, customer: Customer) -> BatchResult<Option<Statement>> {
        let rows = store.statement_rows(customer.customer_id)?;
        let accounts = assemble_accounts(rows);
        Ok(Some(Statement { customer, accounts }))
    }
}

/// Writes `<output_dir>/statement_<customer_id>.txt`, replacing any file
/// left by an earlier attempt.
pub struct StatementFileWriter {
    output_dir: PathBuf,
    renderer:   StatementRenderer,
}

impl StatementFileWriter {
    pub fn new(config: &StatementConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_dir),
            renderer:   StatementRenderer::new(config),
        }
    }

    pub fn path_for(&self, statement: &Statement) -> PathBuf {
        self.output_dir
            .join(format!("statement_{}.txt", statement.customer.customer_id))
    }
}

impl ItemWriter for StatementFileWriter {
    type Item = Statement;

    fn write(&mut self, _store: &BatchStore, items: Vec<Statement>) -> BatchResult<u64> {
        fs::create_dir_all(&self.output_dir)?;
        for statement in &items {
            fs::write(self.path_for(statement), self.renderer.render(statement))?;
        }
        Ok(items.len() as u64)
    }
}
