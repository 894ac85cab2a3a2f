//! Chunk-oriented steps.
//!
//! RULE: A chunk is the unit of commit. Every item read, processed and
//! written for one chunk, plus the step checkpoint, lands in one store
//! transaction. Nothing from a failed chunk is committed.
//!
//! Per chunk: Reading -> Processing (per item) -> Writing -> Committing.
//! Skippable item errors drop the item and the chunk continues.
//! Any other error aborts the step with a `StepFailed` report.

use crate::{
    error::{BatchError, BatchResult, ChunkPhase},
    store::{BatchStore, StepExecution},
};
use std::marker::PhantomData;

/// Source of items for a step.
pub trait ItemReader {
    type Item;

    /// Position the reader before the first chunk. `checkpoint` holds the
    /// counters committed by earlier attempts of this step (zero on a fresh
    /// start).
    fn open(&mut self, store: &BatchStore, checkpoint: &StepExecution) -> BatchResult<()>;

    /// Next item, or `None` once the input is exhausted.
    fn read(&mut self, store: &BatchStore) -> BatchResult<Option<Self::Item>>;
}

/// Per-item transformation. `Ok(None)` filters the item out.
pub trait ItemProcessor {
    type Input;
    type Output;

    fn process(&mut self, store: &BatchStore, item: Self::Input) -> BatchResult<Option<Self::Output>>;
}

/// Receives the surviving items of one chunk. Returns how many were written.
pub trait ItemWriter {
    type Item;

    fn write(&mut self, store: &BatchStore, items: Vec<Self::Item>) -> BatchResult<u64>;
}

/// Processor for steps that write what they read.
pub struct PassThrough<T>(PhantomData<T>);

impl<T> Default for PassThrough<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> ItemProcessor for PassThrough<T> {
    type Input = T;
    type Output = T;

    fn process(&mut self, _store: &BatchStore, item: T) -> BatchResult<Option<T>> {
        Ok(Some(item))
    }
}

/// The contract every step in a job fulfils.
pub trait Step {
    /// Unique stable name, used as the checkpoint key.
    fn name(&self) -> &'static str;

    /// Run the step to completion starting from `execution`, which is
    /// updated after every committed chunk.
    fn execute(
        &mut self,
        store: &BatchStore,
        job_instance_id: i64,
        execution: &mut StepExecution,
    ) -> BatchResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
struct ChunkCounts {
    read:     u64,
    written:  u64,
    filtered: u64,
    skipped:  u64,
}

/// reader -> processor -> writer, committed every `chunk_size` items.
pub struct ChunkStep<R, P, W> {
    name:       &'static str,
    chunk_size: usize,
    reader:     R,
    processor:  P,
    writer:     W,
}

impl<R, P, W> ChunkStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor<Input = R::Item>,
    W: ItemWriter<Item = P::Output>,
{
    pub fn new(name: &'static str, chunk_size: usize, reader: R, processor: P, writer: W) -> Self {
        Self {
            name,
            chunk_size: chunk_size.max(1),
            reader,
            processor,
            writer,
        }
    }

    /// Read, process and write one chunk against an open transaction.
    /// Returns the chunk's counts and whether the reader ran dry.
    fn run_chunk(
        &mut self,
        store: &BatchStore,
        phase: &mut ChunkPhase,
    ) -> BatchResult<(ChunkCounts, bool)> {
        let mut counts = ChunkCounts::default();
        let mut outputs = Vec::with_capacity(self.chunk_size);
        let mut exhausted = false;

        while counts.read < self.chunk_size as u64 {
            *phase = ChunkPhase::Reading;
            let item = match self.reader.read(store) {
                Ok(Some(item)) => item,
                Ok(None) => {
                    exhausted = true;
                    break;
                }
                Err(e) if e.is_skippable() => {
                    log::warn!("step={} skipped unreadable item: {e}", self.name);
                    counts.read += 1;
                    counts.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            counts.read += 1;

            *phase = ChunkPhase::Processing;
            match self.processor.process(store, item) {
                Ok(Some(out)) => outputs.push(out),
                Ok(None) => counts.filtered += 1,
                Err(e) if e.is_skippable() => {
                    log::warn!("step={} skipped item: {e}", self.name);
                    counts.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if !outputs.is_empty() {
            *phase = ChunkPhase::Writing;
            counts.written = self.writer.write(store, outputs)?;
        }
        Ok((counts, exhausted))
    }
}

impl<R, P, W> Step for ChunkStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor<Input = R::Item>,
    W: ItemWriter<Item = P::Output>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(
        &mut self,
        store: &BatchStore,
        job_instance_id: i64,
        execution: &mut StepExecution,
    ) -> BatchResult<()> {
        let name = self.name;
        let fail = |execution: &StepExecution, phase: ChunkPhase, source: BatchError| {
            BatchError::StepFailed {
                step: name.to_string(),
                chunk: execution.commit_count,
                phase,
                committed_items: execution.write_count,
                committed_reads: execution.read_count,
                source: Box::new(source),
            }
        };

        self.reader
            .open(store, execution)
            .map_err(|e| fail(execution, ChunkPhase::Reading, e))?;

        loop {
            let mut phase = ChunkPhase::Reading;
            let mut next = execution.clone();

            let result = store.with_transaction(|store| {
                let (counts, exhausted) = self.run_chunk(store, &mut phase)?;
                phase = ChunkPhase::Committing;
                if counts.read > 0 {
                    next.read_count   += counts.read;
                    next.write_count  += counts.written;
                    next.filter_count += counts.filtered;
                    next.skip_count   += counts.skipped;
                    next.commit_count += 1;
                    store.save_step_execution(job_instance_id, &next)?;
                }
                Ok((counts, exhausted))
            });

            let (counts, exhausted) = result.map_err(|e| fail(execution, phase, e))?;

            if counts.read > 0 {
                log::debug!(
                    "step={name} chunk={} committed: read={} written={} filtered={} skipped={}",
                    execution.commit_count,
                    counts.read,
                    counts.written,
                    counts.filtered,
                    counts.skipped
                );
                *execution = next;
            }
            if exhausted {
                return Ok(());
            }
        }
    }
}
