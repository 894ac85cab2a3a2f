//! The job runner.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. importCustomerUpdates  classify -> validate -> route updates
//!   2. importTransactions     ingest the transaction feed
//!   3. applyTransactions      apply pending transactions to balances
//!   4. generateStatements     assemble and emit one statement per customer
//!
//! RULES:
//!   - Steps execute strictly in registration order; a step starts only
//!     after its predecessor completed.
//!   - Chunks within a step execute sequentially; each commits on its own.
//!   - A job instance is identified by (job name, job key). Re-running the
//!     same instance skips completed steps and resumes the failed one from
//!     its checkpoint.
//!   - Without an explicit key, runs over the same inputs are numbered:
//!     an unfinished latest run is resumed, a completed one is followed by
//!     a new run.

use crate::{
    balance_step,
    config::BatchConfig,
    customer_update_step,
    error::BatchResult,
    statement_step,
    step::Step,
    store::{BatchStore, JobStatus, StepExecution, StepStatus},
    transaction_import_step,
    types::JobKey,
};
use serde::Serialize;
use std::path::PathBuf;

pub const JOB_NAME: &str = "customerStatementJob";

/// Resolved input locators for one run.
#[derive(Debug, Clone)]
pub struct JobInputs {
    pub customer_updates: PathBuf,
    pub transactions:     PathBuf,
}

impl JobInputs {
    /// Base key for runs over these inputs. See `BatchJob::next_run_key`.
    pub fn default_job_key(&self) -> JobKey {
        format!(
            "customerUpdates={};transactions={}",
            self.customer_updates.display(),
            self.transactions.display()
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    #[serde(flatten)]
    pub execution: StepExecution,
    /// True when the step had already completed in an earlier attempt.
    pub skipped_as_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_name:        &'static str,
    pub job_key:         JobKey,
    pub job_instance_id: i64,
    pub steps:           Vec<StepSummary>,
}

impl JobSummary {
    pub fn step(&self, name: &str) -> Option<&StepSummary> {
        self.steps.iter().find(|s| s.execution.step_name == name)
    }

    pub fn total_skipped(&self) -> u64 {
        self.steps.iter().map(|s| s.execution.skip_count).sum()
    }
}

pub struct BatchJob {
    steps: Vec<Box<dyn Step>>,
}

impl BatchJob {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build the job with all four steps registered in order.
    pub fn build(config: &BatchConfig, inputs: &JobInputs) -> Self {
        let sizes = &config.chunk_sizes;
        let mut job = BatchJob::new();
        job.register(Box::new(customer_update_step::build(
            &inputs.customer_updates,
            sizes.customer_updates,
        )));
        job.register(Box::new(transaction_import_step::build(
            &inputs.transactions,
            &config.transaction_timestamp_format,
            sizes.transactions,
        )));
        job.register(Box::new(balance_step::build(sizes.apply_transactions)));
        job.register(Box::new(statement_step::build(&config.statement, sizes.statements)));
        job
    }

    /// Register a step. Call in the documented execution order.
    pub fn register(&mut self, step: Box<dyn Step>) {
        self.steps.push(step);
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Key for the next run over `base`: the latest `base;run=N` instance
    /// while it is unfinished, otherwise the following run number.
    pub fn next_run_key(store: &BatchStore, base: &str) -> BatchResult<JobKey> {
        let runs = store.job_runs(JOB_NAME, base)?;
        if let Some((key, status)) = runs.first() {
            if *status != JobStatus::Completed {
                return Ok(key.clone());
            }
        }
        let last = runs
            .iter()
            .filter_map(|(key, _)| key.strip_prefix(base)?.strip_prefix(";run=")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("{base};run={}", last + 1))
    }

    /// Run (or resume) the job instance identified by `job_key`.
    pub fn run(&mut self, store: &BatchStore, job_key: &str) -> BatchResult<JobSummary> {
        let job_instance_id = match store.job_instance(JOB_NAME, job_key)? {
            Some((id, status)) => {
                log::info!("job={JOB_NAME} key={job_key}: restarting instance {id} (was {})", status.as_str());
                id
            }
            None => store.create_job_instance(JOB_NAME, job_key)?,
        };
        store.set_job_status(job_instance_id, JobStatus::Started)?;

        let mut summary = JobSummary {
            job_name: JOB_NAME,
            job_key: job_key.to_string(),
            job_instance_id,
            steps: Vec::with_capacity(self.steps.len()),
        };

        for step in &mut self.steps {
            let name = step.name();
            let previous = store.step_execution(job_instance_id, name)?;

            if let Some(done) = previous.as_ref().filter(|e| e.status == StepStatus::Completed) {
                log::info!("step={name} already complete; skipping");
                summary.steps.push(StepSummary {
                    execution: done.clone(),
                    skipped_as_complete: true,
                });
                continue;
            }

            let mut execution = previous.unwrap_or_else(|| StepExecution::new(name));
            execution.status = StepStatus::Started;
            store.save_step_execution(job_instance_id, &execution)?;
            log::info!(
                "step={name} starting (committed so far: {} chunks, {} items)",
                execution.commit_count,
                execution.write_count
            );

            if let Err(e) = step.execute(store, job_instance_id, &mut execution) {
                log::error!("{e}");
                execution.status = StepStatus::Failed;
                if let Err(save) = store.save_step_execution(job_instance_id, &execution) {
                    log::error!("step={name}: failed to record step failure: {save}");
                }
                if let Err(save) = store.set_job_status(job_instance_id, JobStatus::Failed) {
                    log::error!("job={JOB_NAME} key={job_key}: failed to record job failure: {save}");
                }
                return Err(e);
            }

            execution.status = StepStatus::Completed;
            store.save_step_execution(job_instance_id, &execution)?;
            log::info!(
                "step={name} completed: read={} written={} filtered={} skipped={} commits={}",
                execution.read_count,
                execution.write_count,
                execution.filter_count,
                execution.skip_count,
                execution.commit_count
            );
            summary.steps.push(StepSummary {
                execution,
                skipped_as_complete: false,
            });
        }

        store.set_job_status(job_instance_id, JobStatus::Completed)?;
        log::info!(
            "job={JOB_NAME} key={job_key} completed; {} items skipped",
            summary.total_skipped()
        );
        Ok(summary)
    }
}

impl Default for BatchJob {
    fn default() -> Self {
        Self::new()
    }
}
