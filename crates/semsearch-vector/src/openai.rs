//! OpenAI-compatible embedding provider.

use async_trait::async_trait;
use reqwest::StatusCode;
use semsearch_core::{Error, Result};
use std::time::Duration;

use crate::embedding::EmbeddingProvider;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Embedding provider speaking the OpenAI `/embeddings` wire format.
pub struct OpenAiEmbeddingProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    /// Creates a new provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token for the API
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`; empty means the default
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            client,
        })
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let message = format!("Embedding API error {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Error::provider_retryable(message)
    } else {
        Error::provider(message)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": model,
            "input": text,
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider_retryable(format!("Failed to call embedding API: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &error_text));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("Failed to parse embedding response: {e}")))?;

        let values = response_body["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| Error::provider("Missing embedding in API response"))?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| Error::provider("Non-numeric value in embedding"))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "openai"
    }
}
