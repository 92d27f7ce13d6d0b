//! Keeps stored embeddings consistent with source records.
//!
//! The [`SyncCoordinator`] reacts to lifecycle events, runs bulk
//! regeneration jobs, deletes embeddings per content type, and reports
//! coverage. Lifecycle handling never fails: a content write must not be
//! rejected because its embedding could not be refreshed, so every problem
//! is logged and swallowed here.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use semsearch_core::{Error, Result};
use serde::Serialize;

use crate::content::ContentSource;
use crate::embedder::Embedder;
use crate::events::{LifecycleEvent, LifecycleKind};
use crate::extractor::TextExtractor;
use crate::jobs::{JobRegistry, JobTicket, RegenerationAck, RegenerationJob};
use crate::settings::{ContentTypeConfig, SharedSettings};
use crate::store::EmbeddingStore;
use crate::types::{CoverageStats, EmbeddingKey, EmbeddingMetadata, EmbeddingRecord, DEFAULT_LOCALE};
use crate::value::ContentRecord;

/// Collaborators shared by the coordinator and the search service.
#[derive(Clone)]
pub struct EngineContext {
    /// Live engine settings.
    pub settings: Arc<SharedSettings>,

    /// Provider adapter.
    pub embedder: Arc<Embedder>,

    /// Embedding persistence.
    pub store: Arc<dyn EmbeddingStore>,

    /// Source records.
    pub content: Arc<dyn ContentSource>,
}

impl EngineContext {
    /// Bundle the collaborators.
    pub fn new(
        settings: Arc<SharedSettings>,
        embedder: Arc<Embedder>,
        store: Arc<dyn EmbeddingStore>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            settings,
            embedder,
            store,
            content,
        }
    }
}

/// Result of handling one lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// An embedding was generated and stored.
    Stored,
    /// Embeddings were removed.
    Deleted {
        /// Number of records removed.
        count: usize,
    },
    /// Nothing changed.
    Skipped,
}

fn require_content_type(content_type: &str) -> Result<()> {
    if content_type.trim().is_empty() {
        return Err(Error::validation("Content type is required"));
    }
    Ok(())
}

fn not_configured(content_type: &str) -> Error {
    Error::validation(format!(
        "Content type {content_type} is not configured for semantic search"
    ))
}

/// Drives extraction, embedding, and storage for lifecycle events and
/// regeneration jobs.
#[derive(Clone)]
pub struct SyncCoordinator {
    ctx: EngineContext,
    jobs: Arc<JobRegistry>,
}

impl SyncCoordinator {
    /// Create a coordinator with an empty job registry.
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            jobs: Arc::new(JobRegistry::new()),
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle events
    // ------------------------------------------------------------------------

    /// Dispatch a lifecycle event.
    pub async fn handle_event(&self, event: &LifecycleEvent) -> SyncOutcome {
        match event.kind {
            LifecycleKind::Created | LifecycleKind::Updated => {
                if self
                    .on_change(&event.content_type, &event.record, event.kind)
                    .await
                {
                    SyncOutcome::Stored
                } else {
                    SyncOutcome::Skipped
                }
            }
            LifecycleKind::Deleted => {
                match self.on_delete(&event.content_type, &event.record).await {
                    0 => SyncOutcome::Skipped,
                    count => SyncOutcome::Deleted { count },
                }
            }
        }
    }

    /// A record was created. Returns whether an embedding was stored.
    pub async fn on_create(&self, content_type: &str, record: &ContentRecord) -> bool {
        self.on_change(content_type, record, LifecycleKind::Created)
            .await
    }

    /// A record was updated. Returns whether an embedding was stored.
    pub async fn on_update(&self, content_type: &str, record: &ContentRecord) -> bool {
        self.on_change(content_type, record, LifecycleKind::Updated)
            .await
    }

    /// A record was deleted. Returns the number of embeddings removed.
    ///
    /// Without a locale on the record (absent or blank), every locale
    /// variant goes.
    pub async fn on_delete(&self, content_type: &str, record: &ContentRecord) -> usize {
        if record.document_id.is_empty() {
            return 0;
        }
        if !self.ctx.settings.snapshot().await.is_configured(content_type) {
            return 0;
        }

        let locale = record.locale.as_deref().filter(|l| !l.trim().is_empty());
        match self
            .ctx
            .store
            .delete_one(content_type, &record.document_id, locale)
            .await
        {
            Ok(count) => {
                log::info!(
                    "Deleted {count} embedding(s) for {content_type}:{}",
                    record.document_id
                );
                count
            }
            Err(e) => {
                log::error!(
                    "Failed to delete embedding for {content_type}:{}: {e}",
                    record.document_id
                );
                0
            }
        }
    }

    async fn on_change(&self, content_type: &str, record: &ContentRecord, kind: LifecycleKind) -> bool {
        if record.document_id.is_empty() {
            return false;
        }

        let settings = self.ctx.settings.snapshot().await;
        if !settings.auto_generate {
            return false;
        }
        let Some(config) = settings.content_type(content_type) else {
            return false;
        };

        let locale = record
            .locale
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_LOCALE);
        let Some(embedding) = self.embed_record(config, record, locale).await else {
            return false;
        };

        match self.ctx.store.upsert(embedding).await {
            Ok(()) => {
                log::info!(
                    "Auto-generated embedding for {content_type}:{} ({kind})",
                    record.document_id
                );
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to save embedding for {content_type}:{}: {e}",
                    record.document_id
                );
                false
            }
        }
    }

    /// Extract and embed `record`, ready to store under `locale`.
    async fn embed_record(
        &self,
        config: &ContentTypeConfig,
        record: &ContentRecord,
        locale: &str,
    ) -> Option<EmbeddingRecord> {
        let text = TextExtractor::for_content_type(config).extract(record, &config.fields);
        if text.is_empty() {
            log::debug!(
                "No text to embed for {}:{}",
                config.content_type,
                record.document_id
            );
            return None;
        }

        let embedding = self.ctx.embedder.embed(&text).await?;
        let dimensions = embedding.vector.len();
        Some(EmbeddingRecord::new(
            EmbeddingKey::new(&config.content_type, &record.document_id, locale),
            embedding.vector,
            EmbeddingMetadata {
                generated_at: Utc::now(),
                text_length: text.chars().count(),
                model: embedding.model,
                dimensions,
            },
        ))
    }

    // ------------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------------

    /// Queue regeneration of every published record of `content_type`.
    ///
    /// Validation happens before anything is queued. The returned ticket
    /// can be awaited or dropped; the job runs either way.
    pub async fn regenerate(&self, content_type: &str, locale: Option<&str>) -> Result<JobTicket> {
        require_content_type(content_type)?;
        let settings = self.ctx.settings.snapshot().await;
        let config = settings
            .content_type(content_type)
            .cloned()
            .ok_or_else(|| not_configured(content_type))?;

        let locale = locale
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCALE)
            .to_string();
        let concurrency = settings.regenerate_concurrency.max(1);

        let job = self.jobs.register(content_type, &locale).await;
        let ack = RegenerationAck::from(&job);

        let this = self.clone();
        let handle = tokio::spawn(async move { this.run_job(job, config, concurrency).await });

        Ok(JobTicket::new(ack, handle))
    }

    async fn run_job(
        &self,
        job: RegenerationJob,
        config: ContentTypeConfig,
        concurrency: usize,
    ) -> RegenerationJob {
        let content_type = config.content_type.as_str();
        let records = match self.ctx.content.list_published(content_type, &job.locale).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("Regenerate error for {content_type}: {e}");
                return self.jobs.fail(&job.id, e.to_string()).await.unwrap_or(job);
            }
        };

        log::info!(
            "Starting regeneration for {content_type} ({} entities)",
            records.len()
        );
        self.jobs.start(&job.id, records.len()).await;

        {
            let config = &config;
            let locale = job.locale.as_str();
            let mut outcomes = stream::iter(records)
                .map(|record| async move { self.regenerate_one(config, &record, locale).await })
                .buffer_unordered(concurrency);
            while let Some(success) = outcomes.next().await {
                self.jobs.record(&job.id, success).await;
            }
        }

        let finished = self.jobs.complete(&job.id).await.unwrap_or(job);
        log::info!(
            "Regeneration complete for {content_type}: {} processed, {} failed",
            finished.processed,
            finished.failed
        );
        finished
    }

    async fn regenerate_one(&self, config: &ContentTypeConfig, record: &ContentRecord, locale: &str) -> bool {
        if record.document_id.is_empty() {
            log::warn!("Skipping {} record without a document id", config.content_type);
            return false;
        }

        let Some(embedding) = self.embed_record(config, record, locale).await else {
            log::warn!("No embedding generated for {}", record.document_id);
            return false;
        };

        match self.ctx.store.upsert(embedding).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save embedding for {}: {e}", record.document_id);
                false
            }
        }
    }

    /// Look up a regeneration job.
    pub async fn job_status(&self, id: &str) -> Option<RegenerationJob> {
        self.jobs.get(id).await
    }

    /// All retained regeneration jobs, oldest first.
    pub async fn jobs(&self) -> Vec<RegenerationJob> {
        self.jobs.list().await
    }

    /// Remove every embedding of `content_type`. Returns the number removed.
    ///
    /// Store failures are logged and reported as zero.
    pub async fn delete_content_type(&self, content_type: &str) -> Result<usize> {
        require_content_type(content_type)?;
        if !self.ctx.settings.snapshot().await.is_configured(content_type) {
            return Err(not_configured(content_type));
        }

        match self.ctx.store.delete_by_content_type(content_type).await {
            Ok(count) => {
                log::info!("Deleted {count} embedding(s) for {content_type}");
                Ok(count)
            }
            Err(e) => {
                log::error!("Failed to delete embeddings for {content_type}: {e}");
                Ok(0)
            }
        }
    }

    /// Coverage per configured content type.
    ///
    /// Types whose counts cannot be read are logged and left out.
    pub async fn stats(&self) -> BTreeMap<String, CoverageStats> {
        let mut stats = BTreeMap::new();
        for content_type in self.ctx.settings.snapshot().await.content_type_names() {
            let total = self.ctx.content.count_published(&content_type).await;
            let with_embeddings = self.ctx.store.count_by_content_type(&content_type).await;
            match (total, with_embeddings) {
                (Ok(total), Ok(with_embeddings)) => {
                    stats.insert(content_type, CoverageStats::new(total, with_embeddings));
                }
                (Err(e), _) | (_, Err(e)) => {
                    log::error!("Stats error for {content_type}: {e}");
                }
            }
        }
        stats
    }
}

// ============================================================================
// Tests
// ============================================================================
