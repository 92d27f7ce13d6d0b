//! Semantic embedding and retrieval engine for semsearch.
//!
//! Indexes structured content records as vector embeddings, keeps those
//! embeddings in step with the records as they change, and retrieves
//! records by cosine similarity to a free-text query.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     semsearch-vector                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TextExtractor (record fields → embeddable text)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Embedder (cached client, text cleaning, soft failures)     │
//! │  └── EmbeddingProvider trait                                │
//! │      ├── OpenAiEmbeddingProvider (+ RetryingProvider)       │
//! │      └── MockEmbeddingProvider                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingStore trait                                       │
//! │  ├── InMemoryEmbeddingStore                                 │
//! │  └── RedbEmbeddingStore                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SyncCoordinator (lifecycle events, regeneration jobs,      │
//! │                   bulk delete, coverage stats)              │
//! │  SearchService (rank → hydrate via ContentSource)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use semsearch_vector::{
//!     ContentTypeConfig, Embedder, EngineContext, EngineSettings, InMemoryContentSource,
//!     InMemoryEmbeddingStore, ProviderSettings, SearchRequest, SearchService, SharedSettings,
//! };
//! use std::sync::Arc;
//!
//! let settings = EngineSettings {
//!     content_types: vec![ContentTypeConfig::new("blog.post", ["title", "body"])],
//!     ..Default::default()
//! };
//! let ctx = EngineContext::new(
//!     Arc::new(SharedSettings::new(settings)),
//!     Arc::new(Embedder::openai(ProviderSettings::with_api_key("sk-..."))),
//!     Arc::new(InMemoryEmbeddingStore::new()),
//!     Arc::new(InMemoryContentSource::new()),
//! );
//!
//! let search = SearchService::new(ctx);
//! let response = search
//!     .search(&SearchRequest::new("cloud computing", "blog.post"))
//!     .await?;
//! for result in response.results {
//!     println!("{}: {:.4}", result.record.document_id, result.similarity_score);
//! }
//! ```

pub mod content;
pub mod embedder;
pub mod embedding;
pub mod events;
pub mod extractor;
pub mod jobs;
pub mod openai;
pub mod retry;
pub mod search;
pub mod settings;
pub mod similarity;
pub mod store;
pub mod sync;
pub mod types;
pub mod value;

// Re-exports — model
pub use types::{
    CoverageStats, DEFAULT_LOCALE, Embedding, EmbeddingKey, EmbeddingMetadata, EmbeddingRecord,
    MultiSearchMetadata, MultiSearchRequest, MultiSearchResponse, ScoredResult, SearchMetadata,
    SearchOptions, SearchRequest, SearchResponse,
};
pub use value::{ContentRecord, ContentValue};

// Re-exports — components
pub use content::{ContentSource, InMemoryContentSource};
pub use embedder::{Embedder, ProviderFactory, ProviderSettings};
pub use embedding::{EmbeddingProvider, MockEmbeddingProvider};
pub use events::{LifecycleEvent, LifecycleKind};
pub use extractor::TextExtractor;
pub use jobs::{JobStatus, JobTicket, RegenerationAck, RegenerationJob};
pub use openai::OpenAiEmbeddingProvider;
pub use retry::RetryingProvider;
pub use search::SearchService;
pub use settings::{ContentTypeConfig, EngineSettings, SearchDefaults, SharedSettings};
pub use similarity::{cosine_similarity, rank, RankOptions, Ranked};
pub use store::{EmbeddingStore, InMemoryEmbeddingStore, RedbEmbeddingStore};
pub use sync::{EngineContext, SyncCoordinator, SyncOutcome};
