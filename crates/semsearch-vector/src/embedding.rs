//! Embedding provider trait and mock implementation.
//!
//! This module defines the `EmbeddingProvider` trait that abstracts over
//! remote embedding APIs. The model is passed on every call so a model
//! switch never requires rebuilding the client.
//!
//! # Providers
//!
//! - `MockEmbeddingProvider`: Deterministic hashed bag-of-words vectors
//! - `OpenAiEmbeddingProvider`: OpenAI-compatible `/embeddings` endpoint
//! - `RetryingProvider`: Exponential-backoff wrapper over any provider

use async_trait::async_trait;
use semsearch_core::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Trait for generating text embeddings.
///
/// Implementations return errors freely; the [`Embedder`](crate::Embedder)
/// adapter is responsible for turning failures into "no embedding".
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for `text` with `model`.
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// A mock embedding provider for testing and offline use.
///
/// Each lowercase word is hashed into one of `dimension` buckets, so texts
/// sharing vocabulary get similar vectors. Exact vectors can be pinned for
/// specific inputs, and the provider can be switched into a failing mode.
pub struct MockEmbeddingProvider {
    dimension: usize,
    pinned: Mutex<HashMap<String, Vec<f32>>>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            pinned: Mutex::new(HashMap::new()),
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose every call fails with a non-retryable error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(1)
        }
    }

    /// Return `vector` whenever the input equals `text`.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        if let Ok(mut pinned) = self.pinned.lock() {
            pinned.insert(text.into(), vector);
        }
        self
    }

    /// Number of `embed` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Generate a deterministic embedding from text.
    fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let bucket = (fnv1a(word.as_bytes()) % self.dimension as u64) as usize;
            embedding[bucket] += 1.0;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::provider("mock provider configured to fail"));
        }
        let pinned = self
            .pinned
            .lock()
            .ok()
            .and_then(|pinned| pinned.get(text).cloned());
        Ok(pinned.unwrap_or_else(|| self.deterministic_embedding(text)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

// ============================================================================
// Tests
// ============================================================================
