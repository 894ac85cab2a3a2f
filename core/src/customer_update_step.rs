//! Step 1: classify, validate and apply customer profile updates.

use crate::{
    customer_update::{classify, CustomerUpdate},
    error::{BatchError, BatchResult},
    step::{ChunkStep, ItemProcessor, ItemReader, ItemWriter},
    store::{BatchStore, StepExecution},
};
use csv::StringRecord;
use std::{fs::File, path::PathBuf};

pub const STEP_NAME: &str = "importCustomerUpdates";

pub type CustomerUpdateStep =
    ChunkStep<CustomerUpdateReader, CustomerExistsValidator, CustomerUpdateWriter>;

pub fn build(input: impl Into<PathBuf>, chunk_size: usize) -> CustomerUpdateStep {
    ChunkStep::new(
        STEP_NAME,
        chunk_size,
        CustomerUpdateReader::new(input),
        CustomerExistsValidator,
        CustomerUpdateWriter,
    )
}

/// Reads the comma-delimited update feed and classifies each record.
pub struct CustomerUpdateReader {
    path:   PathBuf,
    reader: Option<csv::Reader<File>>,
    record: StringRecord,
    count:  u64,
}

impl CustomerUpdateReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:   path.into(),
            reader: None,
            record: StringRecord::new(),
            count:  0,
        }
    }
}

impl ItemReader for CustomerUpdateReader {
    type Item = CustomerUpdate;

    fn open(&mut self, _store: &BatchStore, checkpoint: &StepExecution) -> BatchResult<()> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        // Records consumed by committed chunks are not read again.
        self.count = 0;
        while self.count < checkpoint.read_count && reader.read_record(&mut self.record)? {
            self.count += 1;
        }
        if self.count > 0 {
            log::info!(
                "step={STEP_NAME} resuming {} after {} records",
                self.path.display(),
                self.count
            );
        }
        self.reader = Some(reader);
        Ok(())
    }

    fn read(&mut self, _store: &BatchStore) -> BatchResult<Option<CustomerUpdate>> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(BatchError::Other(anyhow::anyhow!(
                "customer update reader read before open"
            )));
        };
        if !reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        self.count += 1;
        let fields: Vec<&str> = self.record.iter().collect();
        classify(&fields, self.count).map(Some)
    }
}

/// Lets an update through only if its customer exists. Never writes.
pub struct CustomerExistsValidator;

impl ItemProcessor for CustomerExistsValidator {
    type Input = CustomerUpdate;
    type Output = CustomerUpdate;

    fn process(
        &mut self,
        store: &BatchStore,
        item: CustomerUpdate,
    ) -> BatchResult<Option<CustomerUpdate>> {
        let customer_id = item.customer_id();
        if store.customer_count(customer_id)? == 0 {
            return Err(BatchError::ValidationRejected { customer_id });
        }
        Ok(Some(item))
    }
}

/// Routes each update to the coalescing statement for its field group.
pub struct CustomerUpdateWriter;

impl ItemWriter for CustomerUpdateWriter {
    type Item = CustomerUpdate;

    fn write(&mut self, store: &BatchStore, items: Vec<CustomerUpdate>) -> BatchResult<u64> {
        let mut names     = Vec::new();
        let mut addresses = Vec::new();
        let mut contacts  = Vec::new();
        for item in &items {
            match item {
                CustomerUpdate::Name(u)    => names.push(u),
                CustomerUpdate::Address(u) => addresses.push(u),
                CustomerUpdate::Contact(u) => contacts.push(u),
            }
        }

        let mut written = 0;
        if !names.is_empty() {
            written += store.update_customer_names(&names)?.len();
        }
        if !addresses.is_empty() {
            written += store.update_customer_addresses(&addresses)?.len();
        }
        if !contacts.is_empty() {
            written += store.update_customer_contacts(&contacts)?.len();
        }
        Ok(written as u64)
    }
}
