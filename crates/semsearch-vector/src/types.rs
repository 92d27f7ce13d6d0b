//! Common types for the embedding engine.
//!
//! Persisted embedding records, search requests and responses, and
//! coverage statistics. JSON field names are camelCase to match the wire
//! format callers already speak.

use crate::value::ContentRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Locale assumed when a record or request does not carry one.
pub const DEFAULT_LOCALE: &str = "en";

// ============================================================================
// Embedding records
// ============================================================================

/// Identity of a stored embedding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingKey {
    /// Owning content type.
    pub content_type: String,

    /// Source record document id.
    pub content_document_id: String,

    /// Locale variant.
    pub locale: String,
}

impl EmbeddingKey {
    /// Create a key.
    pub fn new(
        content_type: impl Into<String>,
        document_id: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            content_document_id: document_id.into(),
            locale: locale.into(),
        }
    }
}

/// Provenance recorded alongside every vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingMetadata {
    /// When the vector was generated.
    pub generated_at: DateTime<Utc>,

    /// Character length of the extracted text.
    pub text_length: usize,

    /// Model that produced the vector.
    pub model: String,

    /// Vector dimensionality.
    pub dimensions: usize,
}

/// A persisted embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRecord {
    /// Owning content type.
    pub content_type: String,

    /// Source record document id.
    pub content_document_id: String,

    /// Locale variant.
    pub locale: String,

    /// The embedding vector.
    pub embedding: Vec<f32>,

    /// Generation metadata.
    pub embedding_metadata: EmbeddingMetadata,
}

impl EmbeddingRecord {
    /// Assemble a record for `key` from a generated embedding.
    pub fn new(key: EmbeddingKey, embedding: Vec<f32>, metadata: EmbeddingMetadata) -> Self {
        Self {
            content_type: key.content_type,
            content_document_id: key.content_document_id,
            locale: key.locale,
            embedding,
            embedding_metadata: metadata,
        }
    }

    /// The record's identity.
    pub fn key(&self) -> EmbeddingKey {
        EmbeddingKey::new(
            self.content_type.clone(),
            self.content_document_id.clone(),
            self.locale.clone(),
        )
    }

    /// The embedding dimension.
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// A vector produced by the provider, tagged with the model that made it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector.
    pub vector: Vec<f32>,

    /// Model name in effect for the call.
    pub model: String,
}

// ============================================================================
// Search types
// ============================================================================

/// Resolved options for one ranked search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Maximum results to return.
    pub limit: usize,

    /// Minimum similarity score (inclusive).
    pub threshold: f64,

    /// Locale of candidate embeddings and hydrated records.
    pub locale: String,

    /// Optional equality filter on the hydrated record's `domain` field.
    pub domain: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            threshold: 0.3,
            locale: DEFAULT_LOCALE.to_string(),
            domain: None,
        }
    }
}

/// Single content type search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text query (required).
    #[serde(default)]
    pub query: String,

    /// Content type to search (required).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Maximum results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Minimum similarity score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Locale to search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Domain filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl SearchRequest {
    /// Create a request for `query` against `content_type`.
    pub fn new(query: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            content_type: Some(content_type.into()),
            ..Default::default()
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the similarity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the domain filter.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Search across several content types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchRequest {
    /// Free-text query (required).
    #[serde(default)]
    pub query: String,

    /// Content types to search; all configured types when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_types: Option<Vec<String>>,

    /// Maximum results, per type and for the merged list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Minimum similarity score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Locale to search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Domain filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl MultiSearchRequest {
    /// Create a request for `query` across all configured types.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Restrict the search to the given content types.
    pub fn with_content_types<I, S>(mut self, content_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_types = Some(content_types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the similarity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Per-type request for `content_type`.
    pub fn for_content_type(&self, content_type: &str) -> SearchRequest {
        SearchRequest {
            query: self.query.clone(),
            content_type: Some(content_type.to_string()),
            limit: self.limit,
            threshold: self.threshold,
            locale: self.locale.clone(),
            domain: self.domain.clone(),
        }
    }
}

/// A hydrated source record with its similarity score.
///
/// Serializes flat: the record's own fields, then `similarityScore`, then
/// `contentType` when the result came from a multi-type search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    /// The hydrated source record.
    #[serde(flatten)]
    pub record: ContentRecord,

    /// Cosine similarity, rounded to 4 decimals.
    pub similarity_score: f64,

    /// Source content type (multi-type search only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Metadata describing a single-type search.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    /// The query as received.
    pub query: String,

    /// Content type searched.
    pub content_type: String,

    /// Number of results returned.
    pub total_results: usize,

    /// Threshold applied.
    pub threshold: f64,

    /// Why the search produced nothing, when it failed softly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Results of a single-type search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    /// Ranked results, best first.
    pub results: Vec<ScoredResult>,

    /// Request echo and counts.
    pub metadata: SearchMetadata,
}

/// Metadata describing a multi-type search.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchMetadata {
    /// The query as received.
    pub query: String,

    /// Content types that were requested (or all configured ones).
    pub content_types: Vec<String>,

    /// Number of merged results returned.
    pub total_results: usize,
}

/// Results of a multi-type search.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchResponse {
    /// Merged results across types, best first, capped at the limit.
    pub results: Vec<ScoredResult>,

    /// Per-type responses, keyed by content type.
    pub by_content_type: BTreeMap<String, SearchResponse>,

    /// Request echo and counts.
    pub metadata: MultiSearchMetadata,
}

// ============================================================================
// Coverage statistics
// ============================================================================

/// Embedding coverage for one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStats {
    /// Published source records.
    pub total: usize,

    /// Stored embeddings for the type (all locales).
    pub with_embeddings: usize,

    /// `with_embeddings / total` as a rounded percentage; 0 when `total` is 0.
    pub coverage: u64,
}

impl CoverageStats {
    /// Compute coverage from the two counts.
    pub fn new(total: usize, with_embeddings: usize) -> Self {
        let coverage = if total > 0 {
            ((with_embeddings as f64 / total as f64) * 100.0).round() as u64
        } else {
            0
        };
        Self {
            total,
            with_embeddings,
            coverage,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_metadata() -> EmbeddingMetadata {
        EmbeddingMetadata {
            generated_at: DateTime::parse_from_rfc3339("2025-01-15T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            text_length: 42,
            model: "text-embedding-3-small".to_string(),
            dimensions: 3,
        }
    }

    // ------------------------------------------------------------------------
    // EmbeddingRecord tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_embedding_record_key_roundtrip() {
        let key = EmbeddingKey::new("blog.post", "doc-1", "en");
        let record = EmbeddingRecord::new(key.clone(), vec![0.1, 0.2, 0.3], sample_metadata());

        assert_eq!(record.key(), key);
        assert_eq!(record.dimension(), 3);
    }

    #[test]
    fn test_embedding_record_json_field_names() {
        let record = EmbeddingRecord::new(
            EmbeddingKey::new("blog.post", "doc-1", "en"),
            vec![0.5],
            sample_metadata(),
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["contentType"], "blog.post");
        assert_eq!(json["contentDocumentId"], "doc-1");
        assert_eq!(json["embeddingMetadata"]["textLength"], 42);
        assert_eq!(json["embeddingMetadata"]["generatedAt"], "2025-01-15T12:00:00Z");
    }

    #[test]
    fn test_embedding_key_ordering() {
        let a = EmbeddingKey::new("a", "doc-2", "en");
        let b = EmbeddingKey::new("a", "doc-10", "en");
        let c = EmbeddingKey::new("b", "doc-1", "en");
        assert!(b < a);
        assert!(a < c);
    }

    // ------------------------------------------------------------------------
    // Search types tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_search_options_default() {
        let options = SearchOptions::default();
        assert_eq!(options.limit, 10);
        assert_eq!(options.threshold, 0.3);
        assert_eq!(options.locale, "en");
        assert!(options.domain.is_none());
    }

    #[test]
    fn test_search_request_deserialization() {
        let request: SearchRequest = serde_json::from_value(json!({
            "query": "cloud computing",
            "contentType": "blog.post",
            "threshold": 0.9
        }))
        .unwrap();

        assert_eq!(request.query, "cloud computing");
        assert_eq!(request.content_type.as_deref(), Some("blog.post"));
        assert_eq!(request.threshold, Some(0.9));
        assert!(request.limit.is_none());
    }

    #[test]
    fn test_search_request_missing_query_defaults_empty() {
        let request: SearchRequest =
            serde_json::from_value(json!({"contentType": "blog.post"})).unwrap();
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_multi_search_request_for_content_type() {
        let request = MultiSearchRequest::new("q")
            .with_content_types(["a", "b"])
            .with_limit(3)
            .with_threshold(0.5);
        let single = request.for_content_type("b");

        assert_eq!(single.query, "q");
        assert_eq!(single.content_type.as_deref(), Some("b"));
        assert_eq!(single.limit, Some(3));
        assert_eq!(single.threshold, Some(0.5));
    }

    #[test]
    fn test_scored_result_serializes_flat() {
        let result = ScoredResult {
            record: ContentRecord::new("doc-1").with_field("title", "Guide"),
            similarity_score: 0.8123,
            content_type: Some("blog.post".to_string()),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "documentId": "doc-1",
                "title": "Guide",
                "similarityScore": 0.8123,
                "contentType": "blog.post"
            })
        );
    }

    #[test]
    fn test_search_response_metadata_skips_missing_error() {
        let response = SearchResponse {
            results: vec![],
            metadata: SearchMetadata {
                query: "q".into(),
                content_type: "blog.post".into(),
                total_results: 0,
                threshold: 0.9,
                error: None,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["metadata"]["totalResults"], 0);
        assert!(json["metadata"].get("error").is_none());
    }

    // ------------------------------------------------------------------------
    // CoverageStats tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_coverage_zero_total() {
        let stats = CoverageStats::new(0, 0);
        assert_eq!(stats.coverage, 0);

        let stats = CoverageStats::new(0, 5);
        assert_eq!(stats.coverage, 0);
    }

    #[test]
    fn test_coverage_full() {
        assert_eq!(CoverageStats::new(7, 7).coverage, 100);
    }

    #[test]
    fn test_coverage_rounding() {
        assert_eq!(CoverageStats::new(3, 1).coverage, 33);
        assert_eq!(CoverageStats::new(3, 2).coverage, 67);
        assert_eq!(CoverageStats::new(8, 1).coverage, 13);
    }

    #[test]
    fn test_coverage_serialization() {
        let json = serde_json::to_value(CoverageStats::new(4, 2)).unwrap();
        assert_eq!(json, json!({"total": 4, "withEmbeddings": 2, "coverage": 50}));
    }
}
