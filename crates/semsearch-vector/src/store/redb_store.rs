//! Durable embedding store on redb.
//!
//! # Layout
//!
//! A single table maps `contentType␟documentId␟locale` (joined with the
//! ASCII unit separator, U+001F) to the JSON-encoded [`EmbeddingRecord`].
//! Because the content type leads the key, every per-type operation is a
//! prefix range scan. Components containing the separator are rejected.
//!
//! Each mutation runs in its own redb write transaction, so writes are
//! atomic per key and serialized across callers. redb is blocking; all
//! calls hop onto the blocking thread pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use semsearch_core::{Error, Result};

use super::EmbeddingStore;
use crate::types::{EmbeddingKey, EmbeddingRecord};

const EMBEDDINGS: TableDefinition<&str, &str> = TableDefinition::new("embeddings");

const SEPARATOR: char = '\u{1f}';

/// Single-file persistent store.
pub struct RedbEmbeddingStore {
    db: Arc<Database>,
}

impl RedbEmbeddingStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }

        let db = Database::create(path).map_err(store_error)?;

        // Create the table up front so read transactions never miss it.
        let txn = db.begin_write().map_err(store_error)?;
        {
            txn.open_table(EMBEDDINGS).map_err(store_error)?;
        }
        txn.commit().map_err(store_error)?;

        log::debug!("Opened embedding store at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| Error::task(format!("embedding store task failed: {e}")))?
    }
}

fn store_error(e: impl Into<redb::Error>) -> Error {
    Error::store(e.into().to_string())
}

fn check_component(name: &str, value: &str) -> Result<()> {
    if value.contains(SEPARATOR) {
        return Err(Error::validation(format!(
            "{name} must not contain the unit separator character"
        )));
    }
    Ok(())
}

fn type_prefix(content_type: &str) -> Result<String> {
    check_component("content type", content_type)?;
    Ok(format!("{content_type}{SEPARATOR}"))
}

fn document_prefix(content_type: &str, document_id: &str) -> Result<String> {
    check_component("document id", document_id)?;
    Ok(format!("{}{document_id}{SEPARATOR}", type_prefix(content_type)?))
}

fn encode_key(key: &EmbeddingKey) -> Result<String> {
    check_component("locale", &key.locale)?;
    Ok(format!(
        "{}{}",
        document_prefix(&key.content_type, &key.content_document_id)?,
        key.locale
    ))
}

/// Keys and decoded records under `prefix`, in key order.
fn scan_prefix(db: &Database, prefix: &str) -> Result<Vec<(String, EmbeddingRecord)>> {
    let txn = db.begin_read().map_err(store_error)?;
    let table = txn.open_table(EMBEDDINGS).map_err(store_error)?;

    let mut entries = Vec::new();
    for entry in table.range(prefix..).map_err(store_error)? {
        let (key, value) = entry.map_err(store_error)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        let record: EmbeddingRecord = serde_json::from_str(value.value())?;
        entries.push((key.to_string(), record));
    }
    Ok(entries)
}

/// Remove every key under `prefix` in one write transaction.
fn remove_prefix(db: &Database, prefix: &str) -> Result<usize> {
    let txn = db.begin_write().map_err(store_error)?;
    let removed = {
        let mut table = txn.open_table(EMBEDDINGS).map_err(store_error)?;
        let mut keys = Vec::new();
        for entry in table.range(prefix..).map_err(store_error)? {
            let (key, _) = entry.map_err(store_error)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_string());
        }
        for key in &keys {
            table.remove(key.as_str()).map_err(store_error)?;
        }
        keys.len()
    };
    txn.commit().map_err(store_error)?;
    Ok(removed)
}

#[async_trait]
impl EmbeddingStore for RedbEmbeddingStore {
    async fn get(&self, key: &EmbeddingKey) -> Result<Option<EmbeddingRecord>> {
        let encoded = encode_key(key)?;
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(store_error)?;
            let table = txn.open_table(EMBEDDINGS).map_err(store_error)?;
            match table.get(encoded.as_str()).map_err(store_error)? {
                Some(value) => Ok(Some(serde_json::from_str(value.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn upsert(&self, record: EmbeddingRecord) -> Result<()> {
        let encoded = encode_key(&record.key())?;
        let json = serde_json::to_string(&record)?;
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(store_error)?;
            {
                let mut table = txn.open_table(EMBEDDINGS).map_err(store_error)?;
                table
                    .insert(encoded.as_str(), json.as_str())
                    .map_err(store_error)?;
            }
            txn.commit().map_err(store_error)
        })
        .await
    }

    async fn delete_one(
        &self,
        content_type: &str,
        document_id: &str,
        locale: Option<&str>,
    ) -> Result<usize> {
        match locale {
            Some(locale) => {
                let encoded = encode_key(&EmbeddingKey::new(content_type, document_id, locale))?;
                self.blocking(move |db| {
                    let txn = db.begin_write().map_err(store_error)?;
                    let removed = {
                        let mut table = txn.open_table(EMBEDDINGS).map_err(store_error)?;
                        let previous = table.remove(encoded.as_str()).map_err(store_error)?;
                        usize::from(previous.is_some())
                    };
                    txn.commit().map_err(store_error)?;
                    Ok(removed)
                })
                .await
            }
            None => {
                let prefix = document_prefix(content_type, document_id)?;
                self.blocking(move |db| remove_prefix(db, &prefix)).await
            }
        }
    }

    async fn delete_by_content_type(&self, content_type: &str) -> Result<usize> {
        let prefix = type_prefix(content_type)?;
        self.blocking(move |db| remove_prefix(db, &prefix)).await
    }

    async fn list_by_type_and_locale(
        &self,
        content_type: &str,
        locale: &str,
    ) -> Result<Vec<EmbeddingRecord>> {
        let prefix = type_prefix(content_type)?;
        let locale = locale.to_string();
        self.blocking(move |db| {
            Ok(scan_prefix(db, &prefix)?
                .into_iter()
                .map(|(_, record)| record)
                .filter(|record| record.locale == locale)
                .collect())
        })
        .await
    }

    async fn count_by_content_type(&self, content_type: &str) -> Result<usize> {
        let prefix = type_prefix(content_type)?;
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(store_error)?;
            let table = txn.open_table(EMBEDDINGS).map_err(store_error)?;
            let mut count = 0;
            for entry in table.range(prefix.as_str()..).map_err(store_error)? {
                let (key, _) = entry.map_err(store_error)?;
                if !key.value().starts_with(prefix.as_str()) {
                    break;
                }
                count += 1;
            }
            Ok(count)
        })
        .await
    }

    fn name(&self) -> &str {
        "redb"
    }
}
