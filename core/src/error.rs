use crate::types::CustomerId;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema mismatch at record {record}: {reason}")]
    SchemaMismatch { record: u64, reason: String },

    #[error("Format error at record {record}: field '{field}' has invalid value '{value}'")]
    FormatError {
        record: u64,
        field: &'static str,
        value: String,
    },

    #[error("Customer id {customer_id} was not able to be found")]
    ValidationRejected { customer_id: CustomerId },

    #[error(
        "Step '{step}' failed in chunk {chunk} while {phase} \
         ({committed_items} items written, {committed_reads} records read \
         in committed chunks): {source}"
    )]
    StepFailed {
        step: String,
        chunk: u64,
        phase: ChunkPhase,
        /// Items written by committed chunks.
        committed_items: u64,
        /// Records consumed by committed chunks, skipped and filtered ones
        /// included. A restart resumes after this many.
        committed_reads: u64,
        #[source]
        source: Box<BatchError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BatchError {
    /// Skippable errors drop the current item and let the chunk continue.
    /// Everything else aborts the step.
    pub fn is_skippable(&self) -> bool {
        matches!(self, BatchError::ValidationRejected { .. })
    }
}

/// Where inside a chunk an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPhase {
    Reading,
    Processing,
    Writing,
    Committing,
}

impl fmt::Display for ChunkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChunkPhase::Reading    => "reading",
            ChunkPhase::Processing => "processing",
            ChunkPhase::Writing    => "writing",
            ChunkPhase::Committing => "committing",
        };
        f.write_str(s)
    }
}

pub type BatchResult<T> = Result<T, BatchError>;
