//! In-memory embedding store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use semsearch_core::Result;
use tokio::sync::RwLock;

use super::EmbeddingStore;
use crate::types::{EmbeddingKey, EmbeddingRecord};

/// Volatile store for tests and single-process runs.
///
/// Keys sort by `(content type, document id, locale)`, so per-type scans
/// are range reads and listings come out ordered by document id.
#[derive(Debug, Default)]
pub struct InMemoryEmbeddingStore {
    records: RwLock<BTreeMap<EmbeddingKey, EmbeddingRecord>>,
}

impl InMemoryEmbeddingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all content types.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds nothing.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn type_start(content_type: &str) -> EmbeddingKey {
    EmbeddingKey::new(content_type, "", "")
}

#[async_trait]
impl EmbeddingStore for InMemoryEmbeddingStore {
    async fn get(&self, key: &EmbeddingKey) -> Result<Option<EmbeddingRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn upsert(&self, record: EmbeddingRecord) -> Result<()> {
        self.records.write().await.insert(record.key(), record);
        Ok(())
    }

    async fn delete_one(
        &self,
        content_type: &str,
        document_id: &str,
        locale: Option<&str>,
    ) -> Result<usize> {
        let mut records = self.records.write().await;
        if let Some(locale) = locale {
            let key = EmbeddingKey::new(content_type, document_id, locale);
            return Ok(usize::from(records.remove(&key).is_some()));
        }

        let before = records.len();
        records.retain(|key, _| {
            key.content_type != content_type || key.content_document_id != document_id
        });
        Ok(before - records.len())
    }

    async fn delete_by_content_type(&self, content_type: &str) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|key, _| key.content_type != content_type);
        Ok(before - records.len())
    }

    async fn list_by_type_and_locale(
        &self,
        content_type: &str,
        locale: &str,
    ) -> Result<Vec<EmbeddingRecord>> {
        let records = self.records.read().await;
        Ok(records
            .range(type_start(content_type)..)
            .take_while(|(key, _)| key.content_type == content_type)
            .filter(|(key, _)| key.locale == locale)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn count_by_content_type(&self, content_type: &str) -> Result<usize> {
        let records = self.records.read().await;
        Ok(records
            .range(type_start(content_type)..)
            .take_while(|(key, _)| key.content_type == content_type)
            .count())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
