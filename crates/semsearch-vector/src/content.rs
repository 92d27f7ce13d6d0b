//! Content runtime boundary.
//!
//! The engine never owns source records. It reads them through
//! [`ContentSource`]: published listings for regeneration, published counts
//! for coverage, and single-document fetches to hydrate search hits.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use semsearch_core::{Error, Result};
use tokio::sync::RwLock;

use crate::types::DEFAULT_LOCALE;
use crate::value::{ContentRecord, ContentValue};

/// Read access to the host content runtime.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Published records of `content_type` in `locale`.
    async fn list_published(&self, content_type: &str, locale: &str)
    -> Result<Vec<ContentRecord>>;

    /// Number of published records of `content_type`, all locales.
    async fn count_published(&self, content_type: &str) -> Result<usize>;

    /// The published record `document_id` in `locale`, if any.
    async fn fetch_by_document_id(
        &self,
        content_type: &str,
        document_id: &str,
        locale: &str,
    ) -> Result<Option<ContentRecord>>;
}

#[derive(Debug, Clone)]
struct Entry {
    record: ContentRecord,
    published: bool,
}

impl Entry {
    fn locale(&self) -> &str {
        self.record.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    fn matches(&self, document_id: &str, locale: &str) -> bool {
        self.record.document_id == document_id && self.locale() == locale
    }
}

/// Content source held in memory, loadable from a JSON fixture.
///
/// The fixture maps content types to record arrays:
///
/// ```json
/// { "blog.post": [ { "documentId": "a1", "locale": "en", "title": "..." } ] }
/// ```
///
/// A record whose `publishedAt` is explicitly `null` is a draft; every other
/// record counts as published.
#[derive(Debug, Default)]
pub struct InMemoryContentSource {
    entries: RwLock<BTreeMap<String, Vec<Entry>>>,
}

impl InMemoryContentSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        Self::from_json(value)
    }

    /// Build a source from a fixture value.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(types) = value else {
            return Err(Error::invalid_data(
                "content fixture must map content types to record arrays",
            ));
        };

        let mut entries: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
        for (content_type, records) in types {
            let serde_json::Value::Array(records) = records else {
                return Err(Error::invalid_data(format!(
                    "records for {content_type} must be an array"
                )));
            };
            let bucket = entries.entry(content_type).or_default();
            for record in records {
                let record = ContentRecord::from_json(record)?;
                let published = !matches!(record.get("publishedAt"), Some(ContentValue::Null));
                bucket.push(Entry { record, published });
            }
        }

        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Insert or replace a published record.
    pub async fn insert(&self, content_type: &str, record: ContentRecord) {
        self.put(content_type, record, true).await;
    }

    /// Insert or replace a draft record.
    pub async fn insert_draft(&self, content_type: &str, record: ContentRecord) {
        self.put(content_type, record, false).await;
    }

    /// Remove a record's variants; all locales when `locale` is `None`.
    pub async fn remove(&self, content_type: &str, document_id: &str, locale: Option<&str>) -> usize {
        let mut entries = self.entries.write().await;
        let Some(bucket) = entries.get_mut(content_type) else {
            return 0;
        };
        let before = bucket.len();
        bucket.retain(|entry| match locale {
            Some(locale) => !entry.matches(document_id, locale),
            None => entry.record.document_id != document_id,
        });
        before - bucket.len()
    }

    /// Content types present in the source.
    pub async fn content_types(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    async fn put(&self, content_type: &str, record: ContentRecord, published: bool) {
        let mut entries = self.entries.write().await;
        let bucket = entries.entry(content_type.to_string()).or_default();
        let entry = Entry { record, published };
        let locale = entry.locale().to_string();
        match bucket
            .iter_mut()
            .find(|e| e.matches(&entry.record.document_id, &locale))
        {
            Some(existing) => *existing = entry,
            None => bucket.push(entry),
        }
    }
}

#[async_trait]
impl ContentSource for InMemoryContentSource {
    async fn list_published(
        &self,
        content_type: &str,
        locale: &str,
    ) -> Result<Vec<ContentRecord>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(content_type)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|e| e.published && e.locale() == locale)
                    .map(|e| e.record.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_published(&self, content_type: &str) -> Result<usize> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(content_type)
            .map(|bucket| bucket.iter().filter(|e| e.published).count())
            .unwrap_or(0))
    }

    async fn fetch_by_document_id(
        &self,
        content_type: &str,
        document_id: &str,
        locale: &str,
    ) -> Result<Option<ContentRecord>> {
        let entries = self.entries.read().await;
        Ok(entries.get(content_type).and_then(|bucket| {
            bucket
                .iter()
                .find(|e| e.published && e.matches(document_id, locale))
                .map(|e| e.record.clone())
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
