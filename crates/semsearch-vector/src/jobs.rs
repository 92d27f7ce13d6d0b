//! Bulk regeneration job tracking.
//!
//! A regeneration request is acknowledged immediately and runs as a
//! detached task. The [`JobRegistry`] records each job's progress so callers
//! can poll it instead of inferring completion from coverage numbers.

use chrono::{DateTime, Utc};
use semsearch_core::{Error, Result};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Finished jobs kept for status queries.
pub const MAX_RETAINED_JOBS: usize = 100;

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not started.
    Queued,
    /// Processing records.
    Running,
    /// Every record was attempted.
    Completed,
    /// The job could not run (e.g. listing records failed).
    Failed,
}

impl JobStatus {
    /// Whether the job has stopped.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Progress of one regeneration job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationJob {
    /// Job identifier.
    pub id: String,

    /// Content type being regenerated.
    pub content_type: String,

    /// Locale being regenerated.
    pub locale: String,

    /// Current status.
    pub status: JobStatus,

    /// Records listed for processing.
    pub total: usize,

    /// Records embedded and stored.
    pub processed: usize,

    /// Records skipped or failed.
    pub failed: usize,

    /// When the job was accepted.
    pub queued_at: DateTime<Utc>,

    /// When processing began.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When processing stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Why the job failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Immediate reply to a regeneration request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationAck {
    /// Job identifier for status queries.
    pub job_id: String,

    /// Content type being regenerated.
    pub content_type: String,

    /// Locale being regenerated.
    pub locale: String,

    /// Always `queued`.
    pub status: JobStatus,

    /// Human-readable note.
    pub message: String,
}

impl From<&RegenerationJob> for RegenerationAck {
    fn from(job: &RegenerationJob) -> Self {
        Self {
            job_id: job.id.clone(),
            content_type: job.content_type.clone(),
            locale: job.locale.clone(),
            status: job.status,
            message: "Embedding generation has been queued. Check job status or stats for progress."
                .to_string(),
        }
    }
}

/// Handle to a running regeneration job.
///
/// Dropping the ticket detaches from the job; it keeps running.
#[derive(Debug)]
pub struct JobTicket {
    ack: RegenerationAck,
    handle: JoinHandle<RegenerationJob>,
}

impl JobTicket {
    pub(crate) fn new(ack: RegenerationAck, handle: JoinHandle<RegenerationJob>) -> Self {
        Self { ack, handle }
    }

    /// The acknowledgment returned to the caller.
    pub fn ack(&self) -> &RegenerationAck {
        &self.ack
    }

    /// The job identifier.
    pub fn job_id(&self) -> &str {
        &self.ack.job_id
    }

    /// Wait for the job to finish and return its final record.
    pub async fn join(self) -> Result<RegenerationJob> {
        self.handle
            .await
            .map_err(|e| Error::task(format!("regeneration job {} failed: {e}", self.ack.job_id)))
    }
}

/// In-process registry of regeneration jobs.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<Vec<RegenerationJob>>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new queued job.
    pub async fn register(&self, content_type: &str, locale: &str) -> RegenerationJob {
        let job = RegenerationJob {
            id: Uuid::new_v4().to_string(),
            content_type: content_type.to_string(),
            locale: locale.to_string(),
            status: JobStatus::Queued,
            total: 0,
            processed: 0,
            failed: 0,
            queued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        };

        let mut jobs = self.jobs.write().await;
        jobs.push(job.clone());
        prune(&mut jobs);
        job
    }

    /// Look up a job.
    pub async fn get(&self, id: &str) -> Option<RegenerationJob> {
        self.jobs.read().await.iter().find(|j| j.id == id).cloned()
    }

    /// All retained jobs, oldest first.
    pub async fn list(&self) -> Vec<RegenerationJob> {
        self.jobs.read().await.clone()
    }

    /// Mark a job running with `total` records to process.
    pub async fn start(&self, id: &str, total: usize) {
        self.update(id, |job| {
            job.status = JobStatus::Running;
            job.total = total;
            job.started_at = Some(Utc::now());
        })
        .await;
    }

    /// Count one record as processed or failed.
    pub async fn record(&self, id: &str, success: bool) {
        self.update(id, |job| {
            if success {
                job.processed += 1;
            } else {
                job.failed += 1;
            }
        })
        .await;
    }

    /// Mark a job completed.
    pub async fn complete(&self, id: &str) -> Option<RegenerationJob> {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.finished_at = Some(Utc::now());
        })
        .await
    }

    /// Mark a job failed with `error`.
    pub async fn fail(&self, id: &str, error: impl Into<String>) -> Option<RegenerationJob> {
        let error = error.into();
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
            job.finished_at = Some(Utc::now());
        })
        .await
    }

    async fn update<F>(&self, id: &str, apply: F) -> Option<RegenerationJob>
    where
        F: FnOnce(&mut RegenerationJob),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.iter_mut().find(|j| j.id == id)?;
        apply(job);
        Some(job.clone())
    }
}

// Drop the oldest finished jobs beyond the retention cap.
fn prune(jobs: &mut Vec<RegenerationJob>) {
    let mut excess = jobs.len().saturating_sub(MAX_RETAINED_JOBS);
    if excess == 0 {
        return;
    }
    jobs.retain(|job| {
        if excess > 0 && job.status.is_finished() {
            excess -= 1;
            false
        } else {
            true
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
