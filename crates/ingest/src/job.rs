//! Ingestion job records and the registry that tracks them.
//!
//! Jobs live only as long as the process. The owning background task is the
//! only writer; everyone else polls snapshots through [`JobRegistry::get`].

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chronologicon_core::time::iso_millis;

use crate::error::JobStoreError;

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Status only moves forward, and never leaves a terminal state.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self == next {
            return true;
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

// ── Job snapshot ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionJob {
    pub job_id: Uuid,
    pub source_name: String,
    pub status: JobStatus,
    /// Rows accepted by the store, duplicates included.
    pub processed_lines: u64,
    /// Every diagnostic, including those past the error log cap.
    pub error_lines: u64,
    pub total_lines: u64,
    /// First N diagnostics, plus a trailing fatal message on failure.
    pub errors: Vec<String>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(with = "iso_millis::option")]
    pub end_time: Option<DateTime<Utc>>,
}

impl IngestionJob {
    fn new(source_name: &str) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            source_name: source_name.to_string(),
            status: JobStatus::Pending,
            processed_lines: 0,
            error_lines: 0,
            total_lines: 0,
            errors: Vec::new(),
            created_at: Utc::now(),
            start_time: None,
            end_time: None,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub processed_lines: Option<u64>,
    pub error_lines: Option<u64>,
    pub total_lines: Option<u64>,
    pub errors: Option<Vec<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

// ── Registry ─────────────────────────────────────────────────────────

/// Keyed store of ingestion jobs.
pub trait JobRegistry: Send + Sync {
    /// Register a new `Pending` job.
    fn create(&self, source_name: &str) -> IngestionJob;

    fn get(&self, job_id: Uuid) -> Option<IngestionJob>;

    /// Apply `update` and return the resulting snapshot.
    ///
    /// Rejects status changes that would move backwards or out of a terminal
    /// state; in that case nothing is applied.
    fn update(&self, job_id: Uuid, update: JobUpdate) -> Result<IngestionJob, JobStoreError>;

    /// All jobs, oldest first.
    fn list(&self) -> Vec<IngestionJob>;
}

/// In-memory [`JobRegistry`]. Jobs are never evicted.
///
/// Uses `IndexMap` to preserve insertion order (newest last) while
/// allowing O(1) lookups by job ID.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<IndexMap<Uuid, IngestionJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRegistry for InMemoryJobStore {
    fn create(&self, source_name: &str) -> IngestionJob {
        let job = IngestionJob::new(source_name);
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.job_id, job.clone());
        job
    }

    fn get(&self, job_id: Uuid) -> Option<IngestionJob> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
            .cloned()
    }

    fn update(&self, job_id: Uuid, update: JobUpdate) -> Result<IngestionJob, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get_mut(&job_id).ok_or(JobStoreError::NotFound(job_id))?;

        if let Some(next) = update.status {
            if !job.status.can_transition_to(next) {
                return Err(JobStoreError::InvalidTransition {
                    job_id,
                    from: job.status,
                    to: next,
                });
            }
            job.status = next;
        }
        if let Some(v) = update.processed_lines {
            job.processed_lines = v;
        }
        if let Some(v) = update.error_lines {
            job.error_lines = v;
        }
        if let Some(v) = update.total_lines {
            job.total_lines = v;
        }
        if let Some(v) = update.errors {
            job.errors = v;
        }
        if let Some(v) = update.start_time {
            job.start_time = Some(v);
        }
        if let Some(v) = update.end_time {
            job.end_time = Some(v);
        }
        Ok(job.clone())
    }

    fn list(&self) -> Vec<IngestionJob> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
