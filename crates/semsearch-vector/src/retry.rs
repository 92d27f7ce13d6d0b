//! Retry wrapper for embedding providers.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use semsearch_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::embedding::EmbeddingProvider;

/// Wraps an embedding provider with exponential-backoff retries.
///
/// Only errors classified retryable (rate limits, server errors, transport
/// failures) are retried; everything else surfaces on the first attempt.
pub struct RetryingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryingProvider {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max retries: 3
    /// - Initial delay: 500 milliseconds
    /// - Max delay: 10 seconds
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            inner: provider,
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Sets the maximum number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }
}

#[async_trait]
impl EmbeddingProvider for RetryingProvider {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries as usize);

        let provider = self.inner.clone();

        (|| async { provider.embed(text, model).await })
            .retry(backoff)
            .when(Self::should_retry)
            .notify(|err: &Error, delay: Duration| {
                log::warn!("Embedding call failed, retrying in {delay:?}: {err}");
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
