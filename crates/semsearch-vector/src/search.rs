//! Query flow: embed the query, rank stored vectors, hydrate the hits.

use std::collections::{BTreeMap, HashSet};

use semsearch_core::{Error, Result};

use crate::similarity::{rank, RankOptions};
use crate::sync::EngineContext;
use crate::types::{
    Embedding, MultiSearchMetadata, MultiSearchRequest, MultiSearchResponse, ScoredResult, SearchMetadata,
    SearchOptions, SearchRequest, SearchResponse,
};
use crate::value::ContentValue;

/// Metadata error reported when the query could not be embedded.
pub const QUERY_EMBEDDING_FAILED: &str = "Failed to generate query embedding";

/// Single- and multi-type semantic search.
#[derive(Clone)]
pub struct SearchService {
    ctx: EngineContext,
}

fn require_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::validation("Query is required"));
    }
    Ok(())
}

impl SearchService {
    /// Create a search service over `ctx`.
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Search one content type.
    ///
    /// Missing query or content type and unconfigured content types are
    /// rejected before any embedding work. A query that cannot be embedded
    /// yields an empty result with `metadata.error` set.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        require_query(&request.query)?;
        let content_type = request
            .content_type
            .as_deref()
            .filter(|ct| !ct.trim().is_empty())
            .ok_or_else(|| Error::validation("Content type is required"))?;

        let settings = self.ctx.settings.snapshot().await;
        if !settings.is_configured(content_type) {
            return Err(Error::validation(format!(
                "Content type {content_type} is not configured for semantic search"
            )));
        }

        let options = settings.resolve_options(
            request.limit,
            request.threshold,
            request.locale.as_deref(),
            request.domain.as_deref(),
        )?;
        let query_embedding = self.ctx.embedder.embed(&request.query).await;
        self.search_configured(&request.query, query_embedding.as_ref(), content_type, &options)
            .await
    }

    /// Search several content types and merge the results.
    ///
    /// Requested types that are not configured are skipped. Each merged
    /// result carries its `contentType`; the merged list is sorted by score
    /// (ties keep request order) and capped at the limit.
    pub async fn multi_search(&self, request: &MultiSearchRequest) -> Result<MultiSearchResponse> {
        require_query(&request.query)?;

        let settings = self.ctx.settings.snapshot().await;
        let content_types = request
            .content_types
            .clone()
            .unwrap_or_else(|| settings.content_type_names());
        let options = settings.resolve_options(
            request.limit,
            request.threshold,
            request.locale.as_deref(),
            request.domain.as_deref(),
        )?;

        // One query embedding serves every content type.
        let query_embedding = if content_types.iter().any(|ct| settings.is_configured(ct)) {
            self.ctx.embedder.embed(&request.query).await
        } else {
            None
        };

        let mut merged = Vec::new();
        let mut by_content_type = BTreeMap::new();
        let mut seen = HashSet::new();
        for content_type in &content_types {
            if !settings.is_configured(content_type) || !seen.insert(content_type.clone()) {
                continue;
            }

            let response = self
                .search_configured(
                    &request.query,
                    query_embedding.as_ref(),
                    content_type,
                    &options,
                )
                .await?;
            merged.extend(response.results.iter().cloned().map(|mut result| {
                result.content_type = Some(content_type.clone());
                result
            }));
            by_content_type.insert(content_type.clone(), response);
        }

        merged.sort_by(|a: &ScoredResult, b: &ScoredResult| {
            b.similarity_score.total_cmp(&a.similarity_score)
        });
        merged.truncate(options.limit);

        Ok(MultiSearchResponse {
            metadata: MultiSearchMetadata {
                query: request.query.clone(),
                content_types,
                total_results: merged.len(),
            },
            results: merged,
            by_content_type,
        })
    }

    async fn search_configured(
        &self,
        query: &str,
        query_embedding: Option<&Embedding>,
        content_type: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        let mut metadata = SearchMetadata {
            query: query.to_string(),
            content_type: content_type.to_string(),
            total_results: 0,
            threshold: options.threshold,
            error: None,
        };

        let Some(query_embedding) = query_embedding else {
            metadata.error = Some(QUERY_EMBEDDING_FAILED.to_string());
            return Ok(SearchResponse {
                results: Vec::new(),
                metadata,
            });
        };

        let candidates = self
            .ctx
            .store
            .list_by_type_and_locale(content_type, &options.locale)
            .await?;
        let ranked = rank(
            &query_embedding.vector,
            candidates,
            RankOptions {
                limit: options.limit,
                threshold: options.threshold,
            },
            |record| record.embedding.as_slice(),
        );

        let mut results = Vec::with_capacity(ranked.len());
        for hit in ranked {
            let document_id = &hit.item.content_document_id;
            let record = match self
                .ctx
                .content
                .fetch_by_document_id(content_type, document_id, &options.locale)
                .await
            {
                Ok(Some(record)) => record,
                Ok(None) => {
                    log::debug!("Skipping {content_type}:{document_id}: source record not found");
                    continue;
                }
                Err(e) => {
                    log::warn!("Failed to fetch entity {document_id}: {e}");
                    continue;
                }
            };

            if let Some(domain) = options.domain.as_deref()
                && record.get("domain").and_then(ContentValue::as_str) != Some(domain)
            {
                continue;
            }

            results.push(ScoredResult {
                record,
                similarity_score: hit.score,
                content_type: None,
            });
        }

        metadata.total_results = results.len();
        Ok(SearchResponse { results, metadata })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::content::{ContentSource, InMemoryContentSource};
    use crate::embedder::{Embedder, ProviderSettings};
    use crate::embedding::MockEmbeddingProvider;
    use crate::settings::{ContentTypeConfig, EngineSettings, SharedSettings};
    use crate::store::{EmbeddingStore, InMemoryEmbeddingStore};
    use crate::types::{EmbeddingKey, EmbeddingMetadata, EmbeddingRecord};
    use crate::value::ContentRecord;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    const QUERY: &str = "cloud computing";

    struct Fixture {
        search: SearchService,
        store: Arc<InMemoryEmbeddingStore>,
        content: Arc<InMemoryContentSource>,
    }

    fn fixture_with(
        provider: MockEmbeddingProvider,
        content: Arc<dyn ContentSource>,
    ) -> (SearchService, Arc<InMemoryEmbeddingStore>) {
        let settings = EngineSettings {
            content_types: vec![
                ContentTypeConfig::new("blog.post", ["title"]),
                ContentTypeConfig::new("docs.page", ["heading"]),
            ],
            ..Default::default()
        };
        let store = Arc::new(InMemoryEmbeddingStore::new());
        let embedder = Arc::new(Embedder::with_provider(
            ProviderSettings::with_api_key("sk-test"),
            Arc::new(provider),
        ));
        let ctx = EngineContext::new(
            Arc::new(SharedSettings::new(settings)),
            embedder,
            store.clone(),
            content,
        );
        (SearchService::new(ctx), store)
    }

    fn fixture() -> Fixture {
        let provider = MockEmbeddingProvider::new(2).with_vector(QUERY, vec![1.0, 0.0]);
        let content = Arc::new(InMemoryContentSource::new());
        let (search, store) = fixture_with(provider, content.clone());
        Fixture {
            search,
            store,
            content,
        }
    }

    async fn seed(f: &Fixture, ct: &str, id: &str, vector: Vec<f32>, domain: Option<&str>) {
        let key = EmbeddingKey::new(ct, id, "en");
        let dimensions = vector.len();
        f.store
            .upsert(EmbeddingRecord::new(
                key,
                vector,
                EmbeddingMetadata {
                    generated_at: Utc::now(),
                    text_length: 5,
                    model: "m".into(),
                    dimensions,
                },
            ))
            .await
            .unwrap();

        let mut record = ContentRecord::new(id).with_locale("en").with_field("title", id);
        if let Some(domain) = domain {
            record = record.with_field("domain", domain);
        }
        f.content.insert(ct, record).await;
    }

    fn ids(results: &[ScoredResult]) -> Vec<&str> {
        results.iter().map(|r| r.record.document_id.as_str()).collect()
    }

    // ------------------------------------------------------------------------
    // Single-type search
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_search_ranks_and_hydrates() {
        let f = fixture();
        seed(&f, "blog.post", "exact", vec![1.0, 0.0], None).await;
        seed(&f, "blog.post", "close", vec![0.9, 0.1], None).await;
        seed(&f, "blog.post", "unrelated", vec![0.0, 1.0], None).await;

        let response = f
            .search
            .search(&SearchRequest::new(QUERY, "blog.post"))
            .await
            .unwrap();

        assert_eq!(ids(&response.results), vec!["exact", "close"]);
        assert_eq!(response.results[0].similarity_score, 1.0);
        assert_eq!(response.results[1].similarity_score, 0.9939);
        assert_eq!(response.metadata.total_results, 2);
        assert_eq!(response.metadata.threshold, 0.3);
        assert!(response.metadata.error.is_none());
    }

    #[tokio::test]
    async fn test_search_skips_missing_source_records() {
        let f = fixture();
        seed(&f, "blog.post", "kept", vec![1.0, 0.0], None).await;
        seed(&f, "blog.post", "gone", vec![1.0, 0.0], None).await;
        f.content.remove("blog.post", "gone", None).await;

        let response = f
            .search
            .search(&SearchRequest::new(QUERY, "blog.post"))
            .await
            .unwrap();
        assert_eq!(ids(&response.results), vec!["kept"]);
    }

    #[tokio::test]
    async fn test_search_domain_filter() {
        let f = fixture();
        seed(&f, "blog.post", "a", vec![1.0, 0.0], Some("news")).await;
        seed(&f, "blog.post", "b", vec![1.0, 0.0], Some("docs")).await;
        seed(&f, "blog.post", "c", vec![1.0, 0.0], None).await;

        let response = f
            .search
            .search(&SearchRequest::new(QUERY, "blog.post").with_domain("news"))
            .await
            .unwrap();
        assert_eq!(ids(&response.results), vec!["a"]);
    }

    #[tokio::test]
    async fn test_search_validation() {
        let f = fixture();
        let err = f
            .search
            .search(&SearchRequest::new("  ", "blog.post"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Query is required"));

        let request = SearchRequest {
            query: QUERY.into(),
            ..Default::default()
        };
        let err = f.search.search(&request).await.unwrap_err();
        assert!(err.to_string().contains("Content type is required"));

        let err = f
            .search
            .search(&SearchRequest::new(QUERY, "shop.product"))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_options() {
        let f = fixture();
        seed(&f, "blog.post", "exact", vec![1.0, 0.0], None).await;

        for request in [
            SearchRequest::new(QUERY, "blog.post").with_limit(0),
            SearchRequest::new(QUERY, "blog.post").with_threshold(5.0),
            SearchRequest::new(QUERY, "blog.post").with_threshold(f64::NAN),
        ] {
            let err = f.search.search(&request).await.unwrap_err();
            assert!(err.is_client_error());
        }

        let err = f
            .search
            .multi_search(&MultiSearchRequest::new(QUERY).with_limit(0))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_search_embedding_failure_reports_error() {
        let (search, _store) =
            fixture_with(MockEmbeddingProvider::failing(), Arc::new(InMemoryContentSource::new()));
        let response = search
            .search(&SearchRequest::new(QUERY, "blog.post"))
            .await
            .unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.metadata.error.as_deref(), Some(QUERY_EMBEDDING_FAILED));
    }

    struct FlakyContent {
        inner: InMemoryContentSource,
    }

    #[async_trait]
    impl ContentSource for FlakyContent {
        async fn list_published(&self, ct: &str, locale: &str) -> Result<Vec<ContentRecord>> {
            self.inner.list_published(ct, locale).await
        }

        async fn count_published(&self, ct: &str) -> Result<usize> {
            self.inner.count_published(ct).await
        }

        async fn fetch_by_document_id(&self, ct: &str, id: &str, locale: &str) -> Result<Option<ContentRecord>> {
            if id == "broken" {
                return Err(Error::store("timeout"));
            }
            self.inner.fetch_by_document_id(ct, id, locale).await
        }
    }

    #[tokio::test]
    async fn test_search_skips_fetch_failures() {
        let inner = InMemoryContentSource::new();
        inner.insert("blog.post", ContentRecord::new("ok")).await;
        inner.insert("blog.post", ContentRecord::new("broken")).await;
        let provider = MockEmbeddingProvider::new(2).with_vector(QUERY, vec![1.0, 0.0]);
        let (search, store) = fixture_with(provider, Arc::new(FlakyContent { inner }));
        for id in ["broken", "ok"] {
            store
                .upsert(EmbeddingRecord::new(
                    EmbeddingKey::new("blog.post", id, "en"),
                    vec![1.0, 0.0],
                    EmbeddingMetadata {
                        generated_at: Utc::now(),
                        text_length: 1,
                        model: "m".into(),
                        dimensions: 2,
                    },
                ))
                .await
                .unwrap();
        }

        let response = search
            .search(&SearchRequest::new(QUERY, "blog.post"))
            .await
            .unwrap();
        assert_eq!(ids(&response.results), vec!["ok"]);
    }

    // ------------------------------------------------------------------------
    // Multi-type search
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_multi_search_merges_and_tags() {
        let f = fixture();
        seed(&f, "blog.post", "p1", vec![0.8, 0.6], None).await;
        seed(&f, "blog.post", "p2", vec![0.6, 0.8], None).await;
        seed(&f, "docs.page", "d1", vec![1.0, 0.0], None).await;

        let response = f
            .search
            .multi_search(&MultiSearchRequest::new(QUERY).with_limit(2))
            .await
            .unwrap();

        assert_eq!(ids(&response.results), vec!["d1", "p1"]);
        assert_eq!(response.results[0].content_type.as_deref(), Some("docs.page"));
        assert_eq!(response.results[1].content_type.as_deref(), Some("blog.post"));
        assert_eq!(response.by_content_type["blog.post"].results.len(), 2);
        assert!(response.by_content_type["blog.post"].results[0].content_type.is_none());
        assert_eq!(response.metadata.content_types, vec!["blog.post", "docs.page"]);
        assert_eq!(response.metadata.total_results, 2);
    }

    #[tokio::test]
    async fn test_multi_search_embeds_query_once() {
        let provider = Arc::new(MockEmbeddingProvider::new(2).with_vector(QUERY, vec![1.0, 0.0]));
        let settings = EngineSettings {
            content_types: vec![
                ContentTypeConfig::new("blog.post", ["title"]),
                ContentTypeConfig::new("docs.page", ["heading"]),
            ],
            ..Default::default()
        };
        let ctx = EngineContext::new(
            Arc::new(SharedSettings::new(settings)),
            Arc::new(Embedder::with_provider(
                ProviderSettings::with_api_key("sk-test"),
                provider.clone(),
            )),
            Arc::new(InMemoryEmbeddingStore::new()),
            Arc::new(InMemoryContentSource::new()),
        );
        let search = SearchService::new(ctx);

        search.multi_search(&MultiSearchRequest::new(QUERY)).await.unwrap();
        assert_eq!(provider.calls(), 1);

        search
            .multi_search(&MultiSearchRequest::new(QUERY).with_content_types(["shop.product"]))
            .await
            .unwrap();
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_multi_search_skips_unconfigured_types() {
        let f = fixture();
        seed(&f, "blog.post", "p1", vec![1.0, 0.0], None).await;

        let response = f
            .search
            .multi_search(&MultiSearchRequest::new(QUERY).with_content_types(["shop.product", "blog.post"]))
            .await
            .unwrap();

        assert_eq!(ids(&response.results), vec!["p1"]);
        assert!(!response.by_content_type.contains_key("shop.product"));
        assert_eq!(response.metadata.content_types, vec!["shop.product", "blog.post"]);
    }

    #[tokio::test]
    async fn test_multi_search_requires_query() {
        let f = fixture();
        assert!(f.search.multi_search(&MultiSearchRequest::new("")).await.is_err());
    }
}
