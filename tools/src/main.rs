//! batch-runner: headless runner for the statement batch job.
//!
//! Usage:
//!   batch-runner --customer-updates updates.csv --transactions txns.json --db bank.db
//!   batch-runner ... --config batch.json --job-key 2026-10-14 --json

use anyhow::{Context, Result};
use clap::Parser;
use statement_batch_core::{BatchConfig, BatchJob, BatchStore, JobInputs, JobSummary};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "batch-runner", version, about = "Run the customer statement batch job")]
struct Args {
    /// Delimited customer update feed
    #[arg(long, value_name = "FILE")]
    customer_updates: PathBuf,

    /// JSON transaction feed
    #[arg(long, value_name = "FILE")]
    transactions: PathBuf,

    /// SQLite database holding customers, accounts and job metadata
    #[arg(long, value_name = "FILE", default_value = "statement.db")]
    db: String,

    /// Optional JSON config; built-in defaults otherwise
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Job instance key. Re-using a key resumes that instance. Without it,
    /// runs over the same inputs are numbered and a failed run is resumed.
    #[arg(long)]
    job_key: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };

    let inputs = JobInputs {
        customer_updates: args.customer_updates.clone(),
        transactions:     args.transactions.clone(),
    };
    let store = BatchStore::open(&args.db).with_context(|| format!("opening {}", args.db))?;
    store.migrate()?;

    let job_key = match &args.job_key {
        Some(key) => key.clone(),
        None => BatchJob::next_run_key(&store, &inputs.default_job_key())?,
    };

    let mut job = BatchJob::build(&config, &inputs);
    log::info!("running steps {:?} with key {job_key}", job.step_names());
    let summary = job
        .run(&store, &job_key)
        .context("statement batch job failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &config);
    }
    Ok(())
}

fn print_summary(summary: &JobSummary, config: &BatchConfig) {
    println!("=== RUN SUMMARY ===");
    println!("  job:        {}", summary.job_name);
    println!("  key:        {}", summary.job_key);
    println!("  instance:   {}", summary.job_instance_id);
    println!("  statements: {}", config.statement.output_dir);
    println!();
    println!(
        "  {:<24} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "step", "read", "written", "filtered", "skipped", "commits"
    );
    for step in &summary.steps {
        let e = &step.execution;
        let note = if step.skipped_as_complete { " (already complete)" } else { "" };
        println!(
            "  {:<24} {:>8} {:>8} {:>8} {:>8} {:>8}{note}",
            e.step_name, e.read_count, e.write_count, e.filter_count, e.skip_count, e.commit_count
        );
    }
}
