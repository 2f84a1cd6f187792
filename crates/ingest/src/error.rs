//! Ingestion error types.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::job::JobStatus;

/// Failures that end an ingestion job. Row-level problems never surface here;
/// they are recorded on the job as diagnostics.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read failed after line {line}: {source}")]
    Read {
        line: u64,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(Uuid),

    #[error("job {job_id}: illegal status change {from:?} -> {to:?}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
}
