//! Embedding store trait and backends.
//!
//! One store holds the embeddings of every content type, keyed by
//! `(content type, document id, locale)`. At most one record exists per key;
//! [`EmbeddingStore::upsert`] replaces in place.
//!
//! # Backends
//!
//! - [`InMemoryEmbeddingStore`]: `BTreeMap` behind an async lock
//! - [`RedbEmbeddingStore`]: durable single-file store on redb

mod memory;
mod redb_store;

pub use self::memory::InMemoryEmbeddingStore;
pub use self::redb_store::RedbEmbeddingStore;

use crate::types::{EmbeddingKey, EmbeddingRecord};
use async_trait::async_trait;
use semsearch_core::Result;

/// Persistence for embedding records.
///
/// Every write is atomic per key and last-write-wins. Listing returns
/// records ordered by document id so ranking input is deterministic.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Fetch the record stored under `key`.
    async fn get(&self, key: &EmbeddingKey) -> Result<Option<EmbeddingRecord>>;

    /// Insert or replace the record under its key.
    async fn upsert(&self, record: EmbeddingRecord) -> Result<()>;

    /// Delete one document's embeddings.
    ///
    /// With `locale` set only that variant goes; with `None` every locale
    /// variant of the document is removed. Returns the number deleted.
    async fn delete_one(
        &self,
        content_type: &str,
        document_id: &str,
        locale: Option<&str>,
    ) -> Result<usize>;

    /// Delete every embedding of `content_type`. Returns the number deleted.
    async fn delete_by_content_type(&self, content_type: &str) -> Result<usize>;

    /// All embeddings of `content_type` in `locale`, ordered by document id.
    async fn list_by_type_and_locale(
        &self,
        content_type: &str,
        locale: &str,
    ) -> Result<Vec<EmbeddingRecord>>;

    /// Number of embeddings of `content_type` across all locales.
    async fn count_by_content_type(&self, content_type: &str) -> Result<usize>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}
