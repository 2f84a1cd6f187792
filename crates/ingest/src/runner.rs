//! Ingestion job runner: streaming parse and batched insert with progress.
//!
//! [`spawn_ingestion_job`] is the main entry point: it registers a job in the
//! [`JobRegistry`], spawns the work on the tokio runtime, and returns the job
//! id immediately. Callers poll the registry (or use [`wait_for_job`]) for
//! progress.
//!
//! Inside the task a [`BatchIngestor`] reads the source line by line, feeds
//! each line to the parser, and commits valid events in fixed-size batches.
//! A batch that the store rejects as a whole is retried row by row so a single
//! poison row cannot sink its neighbours.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use chronologicon_core::config::IngestConfig;
use chronologicon_core::{EventMetadata, HistoricalEvent};
use chronologicon_storage::EventStore;

use crate::batch::EventBatcher;
use crate::error::IngestError;
use crate::job::{IngestionJob, JobRegistry, JobStatus, JobUpdate};
use crate::line_parser::{parse_line, ParseOutcome};

// ── Public API ──────────────────────────────────────────────────────

/// Spawn an ingestion job for `path` as a background task.
///
/// Returns the job id immediately; the job starts `Pending`. Must be called
/// from within a tokio runtime.
pub fn spawn_ingestion_job(
    registry: Arc<dyn JobRegistry>,
    store: Arc<dyn EventStore>,
    path: PathBuf,
    config: IngestConfig,
) -> Uuid {
    let job = registry.create(&source_name_of(&path));
    let job_id = job.job_id;

    info!(job_id = %job_id, path = %path.display(), "ingestion job queued");

    tokio::spawn(async move {
        ingest_file(registry, store, job_id, &path, config).await;
    });

    job_id
}

/// Run an already-registered job against a file. Returns the final snapshot.
pub async fn ingest_file(
    registry: Arc<dyn JobRegistry>,
    store: Arc<dyn EventStore>,
    job_id: Uuid,
    path: &Path,
    config: IngestConfig,
) -> IngestionJob {
    let ingestor = BatchIngestor::new(registry, store, job_id, source_name_of(path), &config);
    match tokio::fs::File::open(path).await {
        Ok(file) => ingestor.run(BufReader::new(file)).await,
        Err(source) => {
            let ingestor = ingestor.start();
            ingestor.finish(Err(IngestError::Open {
                path: path.to_path_buf(),
                source,
            }))
        }
    }
}

/// Run an already-registered job against any buffered reader.
pub async fn ingest_reader<R>(
    registry: Arc<dyn JobRegistry>,
    store: Arc<dyn EventStore>,
    job_id: Uuid,
    source_name: &str,
    reader: R,
    config: IngestConfig,
) -> IngestionJob
where
    R: AsyncBufRead + Unpin,
{
    BatchIngestor::new(registry, store, job_id, source_name.to_string(), &config)
        .run(reader)
        .await
}

/// Poll until the job reaches a terminal status.
///
/// Returns `None` if the job id is unknown.
pub async fn wait_for_job(
    registry: &dyn JobRegistry,
    job_id: Uuid,
    poll_interval: Duration,
) -> Option<IngestionJob> {
    loop {
        let job = registry.get(job_id)?;
        if job.status.is_terminal() {
            return Some(job);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

// ── Ingestor ────────────────────────────────────────────────────────

/// Bounded diagnostic log. Entries past the cap are dropped, not counted.
struct ErrorLog {
    cap: usize,
    entries: Vec<String>,
}

impl ErrorLog {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: String) {
        if self.entries.len() < self.cap {
            self.entries.push(entry);
        }
    }
}

/// Owns the counters of one job for the duration of one pass.
pub struct BatchIngestor {
    registry: Arc<dyn JobRegistry>,
    store: Arc<dyn EventStore>,
    job_id: Uuid,
    source_name: String,
    batcher: EventBatcher,
    errors: ErrorLog,
    processed: u64,
    failed: u64,
    lines_seen: u64,
    started: Instant,
}

impl BatchIngestor {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        store: Arc<dyn EventStore>,
        job_id: Uuid,
        source_name: String,
        config: &IngestConfig,
    ) -> Self {
        Self {
            registry,
            store,
            job_id,
            source_name,
            batcher: EventBatcher::new(config.batch_size),
            errors: ErrorLog::new(config.error_log_cap),
            processed: 0,
            failed: 0,
            lines_seen: 0,
            started: Instant::now(),
        }
    }

    /// Consume `reader` to the end (or to the first read failure) and
    /// return the final job snapshot.
    pub async fn run<R>(mut self, reader: R) -> IngestionJob
    where
        R: AsyncBufRead + Unpin,
    {
        self = self.start();
        let result = self.consume(reader).await;
        self.finish(result)
    }

    fn start(mut self) -> Self {
        self.started = Instant::now();
        self.publish(JobUpdate {
            status: Some(JobStatus::Processing),
            start_time: Some(Utc::now()),
            ..Default::default()
        });
        info!(job_id = %self.job_id, source = %self.source_name, "ingestion job started");
        self
    }

    async fn consume<R>(&mut self, reader: R) -> Result<(), IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(source) => {
                    return Err(IngestError::Read {
                        line: self.lines_seen,
                        source,
                    })
                }
            };
            self.lines_seen += 1;
            self.handle_line(&line);

            if let Some(batch) = self.batcher.try_flush() {
                self.commit(batch).await;
            }
        }

        if !self.batcher.is_empty() {
            let batch = self.batcher.flush();
            self.commit(batch).await;
        }
        Ok(())
    }

    fn handle_line(&mut self, raw: &str) {
        let line_number = self.lines_seen;
        match parse_line(raw, line_number) {
            ParseOutcome::Skip => {}
            ParseOutcome::Invalid(diagnostic) => {
                debug!(job_id = %self.job_id, line = line_number, issue = %diagnostic.issue, "rejected line");
                self.record_error(diagnostic.to_string());
            }
            ParseOutcome::Event(event) => {
                let event = event.with_metadata(EventMetadata {
                    source_file: self.source_name.clone(),
                    line_number,
                    parsed_at: Utc::now(),
                });
                self.batcher.push(event);
            }
        }
    }

    fn record_error(&mut self, entry: String) {
        self.failed += 1;
        self.errors.push(entry);
    }

    /// Insert one batch; on failure fall back to row-by-row inserts.
    async fn commit(&mut self, batch: Vec<HistoricalEvent>) {
        match self.store.insert_batch(&batch).await {
            Ok(inserted) => {
                self.processed += batch.len() as u64;
                debug!(
                    job_id = %self.job_id,
                    rows = batch.len(),
                    inserted,
                    "batch committed"
                );
            }
            Err(e) => {
                warn!(
                    job_id = %self.job_id,
                    rows = batch.len(),
                    line = self.lines_seen,
                    error = %e,
                    "batch insert failed, retrying rows individually"
                );
                for event in &batch {
                    match self.store.insert_batch(std::slice::from_ref(event)).await {
                        Ok(_) => self.processed += 1,
                        Err(row_err) => {
                            let line = event
                                .metadata
                                .as_ref()
                                .map_or(self.lines_seen, |m| m.line_number);
                            self.record_error(format!(
                                "Line {}: DB insert error for event '{}': {}",
                                line, event.event_id, row_err
                            ));
                        }
                    }
                }
            }
        }
        self.publish_progress();
    }

    fn publish_progress(&self) {
        self.publish(JobUpdate {
            processed_lines: Some(self.processed),
            error_lines: Some(self.failed),
            total_lines: Some(self.lines_seen),
            errors: Some(self.errors.entries.clone()),
            ..Default::default()
        });
    }

    fn finish(self, result: Result<(), IngestError>) -> IngestionJob {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let mut errors = self.errors.entries.clone();

        let status = match &result {
            Ok(()) => {
                info!(
                    job_id = %self.job_id,
                    source = %self.source_name,
                    processed = self.processed,
                    errors = self.failed,
                    lines = self.lines_seen,
                    duration_ms,
                    "ingestion job completed"
                );
                JobStatus::Completed
            }
            Err(e) => {
                error!(
                    job_id = %self.job_id,
                    source = %self.source_name,
                    processed = self.processed,
                    lines = self.lines_seen,
                    error = %e,
                    "ingestion job failed"
                );
                errors.push(format!("Fatal error: {e}"));
                JobStatus::Failed
            }
        };

        self.publish(JobUpdate {
            status: Some(status),
            processed_lines: Some(self.processed),
            error_lines: Some(self.failed),
            total_lines: Some(self.lines_seen),
            errors: Some(errors),
            end_time: Some(Utc::now()),
            ..Default::default()
        })
        .unwrap_or_else(|| self.detached_snapshot(status))
    }

    /// Best-effort registry write. Registry trouble never stops ingestion.
    fn publish(&self, update: JobUpdate) -> Option<IngestionJob> {
        match self.registry.update(self.job_id, update) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "failed to update job registry");
                None
            }
        }
    }

    /// Snapshot built from local counters when the registry lost the job.
    fn detached_snapshot(&self, status: JobStatus) -> IngestionJob {
        IngestionJob {
            job_id: self.job_id,
            source_name: self.source_name.clone(),
            status,
            processed_lines: self.processed,
            error_lines: self.failed,
            total_lines: self.lines_seen,
            errors: self.errors.entries.clone(),
            created_at: Utc::now(),
            start_time: None,
            end_time: Some(Utc::now()),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// File name without directories, as recorded in event provenance.
fn source_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Tests ───────────────────────────────────────────────────────────
