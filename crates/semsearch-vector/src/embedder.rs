//! Provider adapter: turns text into an [`Embedding`] or nothing.
//!
//! [`Embedder`] owns the provider settings and a lazily built client. The
//! client is cached against the `(api key, base URL)` pair it was built
//! with; changing either through [`Embedder::reconfigure`] makes the next
//! call rebuild it. Calls already in flight keep their own `Arc` to the old
//! client and finish against it. The model is read on every call, so a
//! model switch needs no rebuild at all.
//!
//! Remote failures never escape: they are logged and reported as `None`.

use regex::Regex;
use semsearch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::embedding::EmbeddingProvider;
use crate::openai::{OpenAiEmbeddingProvider, DEFAULT_BASE_URL};
use crate::retry::RetryingProvider;
use crate::types::Embedding;

/// Maximum characters sent to the provider per call.
pub const MAX_INPUT_CHARS: usize = 8000;

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

#[allow(clippy::expect_used)]
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

// ============================================================================
// Provider settings
// ============================================================================

/// Connection settings for the remote embedding API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderSettings {
    /// API key; empty means unconfigured.
    pub api_key: String,

    /// API root URL.
    pub base_url: String,

    /// Embedding model; empty means unconfigured.
    pub model: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for rate-limit and server errors.
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl ProviderSettings {
    /// Settings with `api_key` and defaults for everything else.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The API key with everything but the edges hidden.
    ///
    /// Keys shorter than 8 characters are masked entirely; longer keys show
    /// the first 3 and last 4 characters.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() < 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}{}{tail}", "*".repeat(chars.len() - 7))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

// ============================================================================
// Embedder
// ============================================================================

/// Builds a provider client from settings.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderSettings) -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;

struct CachedClient {
    api_key: String,
    base_url: String,
    provider: Arc<dyn EmbeddingProvider>,
}

/// Lazily configured gateway to the remote embedding API.
pub struct Embedder {
    settings: RwLock<ProviderSettings>,
    client: RwLock<Option<CachedClient>>,
    factory: ProviderFactory,
}

impl Embedder {
    /// Create an embedder that builds clients through `factory`.
    pub fn new(settings: ProviderSettings, factory: ProviderFactory) -> Self {
        Self {
            settings: RwLock::new(settings),
            client: RwLock::new(None),
            factory,
        }
    }

    /// Create an embedder backed by the OpenAI-compatible provider with retries.
    pub fn openai(settings: ProviderSettings) -> Self {
        Self::new(settings, openai_factory())
    }

    /// Create an embedder that always hands out `provider`.
    pub fn with_provider(settings: ProviderSettings, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(
            settings,
            Arc::new(
                move |_: &ProviderSettings| -> Result<Arc<dyn EmbeddingProvider>> {
                    Ok(provider.clone())
                },
            ),
        )
    }

    /// A copy of the current settings.
    pub async fn settings(&self) -> ProviderSettings {
        self.settings.read().await.clone()
    }

    /// Swap the provider settings. Takes effect on the next call.
    pub async fn reconfigure(&self, settings: ProviderSettings) {
        *self.settings.write().await = settings;
    }

    /// The client for the current settings, building it if needed.
    pub async fn client(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let settings = self.settings().await;
        if settings.api_key.is_empty() {
            return Err(Error::config("embedding API key is not configured"));
        }

        if let Some(cached) = self.client.read().await.as_ref()
            && cached.api_key == settings.api_key
            && cached.base_url == settings.base_url
        {
            return Ok(cached.provider.clone());
        }

        let mut slot = self.client.write().await;
        if let Some(cached) = slot.as_ref() {
            if cached.api_key == settings.api_key && cached.base_url == settings.base_url {
                return Ok(cached.provider.clone());
            }
            log::info!("Embedding provider configuration changed; rebuilding client");
        }

        let provider = (self.factory)(&settings)?;
        *slot = Some(CachedClient {
            api_key: settings.api_key,
            base_url: settings.base_url,
            provider: provider.clone(),
        });
        Ok(provider)
    }

    /// Embed `text`, or `None` when there is nothing to embed, the provider
    /// is unconfigured, or the remote call fails.
    pub async fn embed(&self, text: &str) -> Option<Embedding> {
        let input = clean_text(text);
        if input.is_empty() {
            return None;
        }

        let model = self.settings.read().await.model.clone();
        if model.is_empty() {
            log::warn!("Embedding model is not configured");
            return None;
        }

        let provider = match self.client().await {
            Ok(provider) => provider,
            Err(e) => {
                log::warn!("Embedding provider unavailable: {e}");
                return None;
            }
        };

        log::debug!(
            "Calling embedding provider {} with model {model}, input length {}",
            provider.name(),
            input.chars().count()
        );
        match provider.embed(&input, &model).await {
            Ok(vector) if vector.is_empty() => {
                log::error!("Embedding provider returned an empty vector");
                None
            }
            Ok(vector) => Some(Embedding { vector, model }),
            Err(e) => {
                log::error!("Embedding error: {e}");
                None
            }
        }
    }
}

fn openai_factory() -> ProviderFactory {
    Arc::new(|settings: &ProviderSettings| -> Result<Arc<dyn EmbeddingProvider>> {
        let provider = OpenAiEmbeddingProvider::new(
            settings.api_key.clone(),
            settings.base_url.clone(),
            settings.timeout(),
        )?;
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(
            RetryingProvider::new(Arc::new(provider)).with_max_retries(settings.max_retries),
        );
        Ok(provider)
    })
}

/// Strip markup, collapse whitespace, and cap the length of `text`.
pub fn clean_text(text: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(text, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_INPUT_CHARS).collect()
}

// ============================================================================
// Tests
// ============================================================================
