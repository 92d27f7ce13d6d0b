//! Configuration for the semsearch CLI.
//!
//! Provides [`SemsearchConfig`], loaded from TOML files, environment
//! variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `SEMSEARCH_CONFIG` environment variable
//! 3. XDG default: `~/.config/semsearch/config.toml`
//! 4. Built-in defaults

use confyg::{Confygery, env};
use semsearch_core::traits::ConfigProvider;
use semsearch_core::{Error, Result};
use semsearch_vector::{
    ContentTypeConfig, EngineSettings, ProviderSettings, SearchDefaults, SearchOptions,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SEMSEARCH_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the semsearch CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemsearchConfig {
    /// Project name, used for env var prefixes and default paths.
    pub project_name: String,

    /// Base path for all project data.
    pub base_path: Option<String>,

    /// Embedding provider configuration.
    pub provider: ProviderConfig,

    /// Search defaults.
    pub search: SearchConfig,

    /// Lifecycle sync configuration.
    pub sync: SyncConfig,

    /// Embedding store configuration.
    pub store: StoreConfig,

    /// Content export configuration.
    pub content: ContentConfig,

    /// Indexed content types.
    pub content_types: Vec<ContentTypeEntry>,
}

/// Which embedding provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible HTTP API.
    #[default]
    OpenAi,
    /// Offline hashed bag-of-words vectors.
    Mock,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider implementation.
    pub kind: ProviderKind,

    /// API key; empty leaves the provider unconfigured.
    pub api_key: String,

    /// API root URL.
    pub base_url: String,

    /// Embedding model.
    pub model: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for rate-limit and server errors.
    pub max_retries: u32,

    /// Vector dimension for the mock provider.
    pub mock_dimension: usize,
}

/// Search defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default result limit.
    pub limit: usize,

    /// Default similarity threshold.
    pub threshold: f64,

    /// Default locale.
    pub locale: String,
}

/// Lifecycle sync configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Generate embeddings on create/update events.
    pub auto_generate: bool,

    /// Records embedded concurrently by a regeneration job.
    pub regenerate_concurrency: usize,
}

/// Embedding store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Persistent redb file.
    #[default]
    Redb,
    /// Process-local map, discarded on exit.
    Memory,
}

/// Embedding store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to open.
    pub backend: StoreBackend,

    /// Path of the redb file.
    pub path: Option<String>,
}

/// Content export configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Path to the JSON content export.
    pub path: Option<String>,
}

/// One indexed content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeEntry {
    /// Content type identifier, e.g. `"blog.post"`.
    pub name: String,

    /// Fields whose values feed the embedding text, in order.
    pub fields: Vec<String>,

    /// Extra property names to skip inside nested values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for SemsearchConfig {
    fn default() -> Self {
        Self {
            project_name: "semsearch".to_string(),
            base_path: None,
            provider: ProviderConfig::default(),
            search: SearchConfig::default(),
            sync: SyncConfig::default(),
            store: StoreConfig::default(),
            content: ContentConfig::default(),
            content_types: Vec::new(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let settings = ProviderSettings::default();
        Self {
            kind: ProviderKind::default(),
            api_key: settings.api_key,
            base_url: settings.base_url,
            model: settings.model,
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
            mock_dimension: 256,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            limit: options.limit,
            threshold: options.threshold,
            locale: options.locale,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_generate: true,
            regenerate_concurrency: EngineSettings::default().regenerate_concurrency,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl SemsearchConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("SEMSEARCH");
        env_opts.add_section("provider");
        env_opts.add_section("search");
        env_opts.add_section("sync");
        env_opts.add_section("store");
        env_opts.add_section("content");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("semsearch").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// A copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.provider.api_key = self.provider_settings().masked_api_key();
        config
    }

    /// Provider settings for the embedder.
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            api_key: self.provider.api_key.clone(),
            base_url: self.provider.base_url.clone(),
            model: self.provider.model.clone(),
            timeout_secs: self.provider.timeout_secs,
            max_retries: self.provider.max_retries,
        }
    }

    /// Engine settings for sync and search.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            auto_generate: self.sync.auto_generate,
            content_types: self
                .content_types
                .iter()
                .map(|entry| {
                    ContentTypeConfig::new(entry.name.clone(), entry.fields.iter().cloned())
                        .with_excluded_fields(entry.exclude.iter().cloned())
                })
                .collect(),
            search: SearchDefaults {
                limit: self.search.limit,
                threshold: self.search.threshold,
                locale: self.search.locale.clone(),
            },
            regenerate_concurrency: self.sync.regenerate_concurrency,
        }
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for SemsearchConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn base_path(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine base path: {e}"))),
        }
    }

    fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(self.base_path()?.join("embeddings.redb")),
        }
    }

    fn content_path(&self) -> Result<PathBuf> {
        match &self.content.path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(self.base_path()?.join("content.json")),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
