//! Handler functions for engine commands.
//!
//! Every handler prints its result to stdout as pretty JSON.

use crate::cli::Command;
use semsearch_core::{Error, Result};
use semsearch_vector::{
    ContentRecord, EngineContext, LifecycleEvent, MultiSearchRequest, SearchRequest,
    SearchService, SyncCoordinator,
};
use serde::Serialize;
use serde_json::json;
use std::path::Path;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle an engine command against `ctx`.
pub async fn handle_command(ctx: EngineContext, command: Command) -> Result<()> {
    let value = match command {
        Command::Search {
            query,
            content_type,
            limit,
            threshold,
            locale,
            domain,
        } => {
            let request = SearchRequest {
                query,
                content_type: Some(content_type),
                limit,
                threshold,
                locale,
                domain,
            };
            to_json(&SearchService::new(ctx).search(&request).await?)?
        }
        Command::MultiSearch {
            query,
            content_types,
            limit,
            threshold,
            locale,
            domain,
        } => {
            let request = MultiSearchRequest {
                query,
                content_types: (!content_types.is_empty()).then_some(content_types),
                limit,
                threshold,
                locale,
                domain,
            };
            to_json(&SearchService::new(ctx).multi_search(&request).await?)?
        }
        Command::Regenerate {
            content_type,
            locale,
        } => cmd_regenerate(ctx, &content_type, locale.as_deref()).await?,
        Command::Delete { content_type } => {
            let deleted = SyncCoordinator::new(ctx)
                .delete_content_type(&content_type)
                .await?;
            json!({ "contentType": content_type, "deleted": deleted })
        }
        Command::Stats => to_json(&SyncCoordinator::new(ctx).stats().await)?,
        Command::Sync {
            event,
            content_type,
            record,
        } => {
            let record = read_record(Path::new(&record))?;
            let event = LifecycleEvent::new(event.into(), content_type, record);
            to_json(&SyncCoordinator::new(ctx).handle_event(&event).await)?
        }
        Command::Version | Command::Config(_) => {
            return Err(Error::validation("command is not an engine command"));
        }
    };

    print_json(&value)
}

// ============================================================================
// Command handlers
// ============================================================================

/// Start a regeneration job and wait for it to finish.
async fn cmd_regenerate(
    ctx: EngineContext,
    content_type: &str,
    locale: Option<&str>,
) -> Result<serde_json::Value> {
    let ticket = SyncCoordinator::new(ctx)
        .regenerate(content_type, locale)
        .await?;
    tracing::info!(
        "Regeneration job {} queued for {}",
        ticket.job_id(),
        content_type
    );
    let job = ticket.join().await?;
    to_json(&job)
}

/// Read a content record from a JSON file.
fn read_record(path: &Path) -> Result<ContentRecord> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    ContentRecord::from_json(value)
}

// ============================================================================
// Output helpers
// ============================================================================

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::EventArg;
    use semsearch_vector::{
        ContentTypeConfig, Embedder, EmbeddingKey, EmbeddingStore, EngineSettings,
        InMemoryContentSource, InMemoryEmbeddingStore, MockEmbeddingProvider, ProviderSettings,
        SharedSettings,
    };
    use std::sync::Arc;

    struct Fixture {
        ctx: EngineContext,
        store: Arc<InMemoryEmbeddingStore>,
    }

    fn fixture() -> Fixture {
        let content = InMemoryContentSource::from_json(json!({
            "blog.post": [
                {"documentId": "d1", "title": "Cloud migration guide"},
                {"documentId": "d2", "title": "Gardening for beginners"}
            ]
        }))
        .unwrap();
        let settings = EngineSettings {
            auto_generate: true,
            content_types: vec![ContentTypeConfig::new("blog.post", ["title"])],
            ..Default::default()
        };
        let store = Arc::new(InMemoryEmbeddingStore::new());
        let ctx = EngineContext::new(
            Arc::new(SharedSettings::new(settings)),
            Arc::new(Embedder::with_provider(
                ProviderSettings::with_api_key("sk-test"),
                Arc::new(MockEmbeddingProvider::new(16)),
            )),
            store.clone(),
            Arc::new(content),
        );
        Fixture { ctx, store }
    }

    #[tokio::test]
    async fn test_regenerate_then_search_and_delete() {
        let f = fixture();
        let regenerate = Command::Regenerate {
            content_type: "blog.post".into(),
            locale: None,
        };
        handle_command(f.ctx.clone(), regenerate).await.unwrap();
        assert_eq!(f.store.len().await, 2);

        let search = Command::Search {
            query: "cloud migration".into(),
            content_type: "blog.post".into(),
            limit: Some(1),
            threshold: Some(0.0),
            locale: None,
            domain: None,
        };
        handle_command(f.ctx.clone(), search).await.unwrap();

        let delete = Command::Delete {
            content_type: "blog.post".into(),
        };
        handle_command(f.ctx.clone(), delete).await.unwrap();
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_search_validation_error_propagates() {
        let f = fixture();
        let search = Command::Search {
            query: "cloud".into(),
            content_type: "docs.page".into(),
            limit: None,
            threshold: None,
            locale: None,
            domain: None,
        };
        let err = handle_command(f.ctx, search).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_sync_replays_record_file() {
        let f = fixture();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, r#"{"documentId": "d9", "title": "Fresh post"}"#).unwrap();

        let sync = Command::Sync {
            event: EventArg::Created,
            content_type: "blog.post".into(),
            record: path.to_string_lossy().into_owned(),
        };
        handle_command(f.ctx.clone(), sync).await.unwrap();

        let key = EmbeddingKey::new("blog.post", "d9", "en");
        assert!(f.store.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sync_missing_record_file() {
        let f = fixture();
        let sync = Command::Sync {
            event: EventArg::Deleted,
            content_type: "blog.post".into(),
            record: "/nonexistent/record.json".into(),
        };
        assert!(handle_command(f.ctx, sync).await.is_err());
    }

    #[tokio::test]
    async fn test_stats_and_multi_search() {
        let f = fixture();
        handle_command(f.ctx.clone(), Command::Stats).await.unwrap();
        let multi = Command::MultiSearch {
            query: "cloud".into(),
            content_types: Vec::new(),
            limit: None,
            threshold: None,
            locale: None,
            domain: None,
        };
        handle_command(f.ctx, multi).await.unwrap();
    }
}
