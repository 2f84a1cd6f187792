//! Streaming ingestion of pipe-delimited event files.
//!
//! Lines are parsed one at a time, valid events are committed in batches,
//! and progress is published to a [`JobRegistry`] that callers poll.

pub mod batch;
pub mod error;
pub mod job;
pub mod line_parser;
pub mod runner;

pub use batch::EventBatcher;
pub use error::{IngestError, JobStoreError};
pub use job::{InMemoryJobStore, IngestionJob, JobRegistry, JobStatus, JobUpdate};
pub use line_parser::{parse_line, LineDiagnostic, ParseIssue, ParseOutcome};
pub use runner::{ingest_file, ingest_reader, spawn_ingestion_job, wait_for_job, BatchIngestor};
