//! Engine settings: which content types are indexed and how searches
//! default.
//!
//! Settings are read fresh by every lifecycle event and request, so an
//! administrator's change takes effect on the next call. [`SharedSettings`]
//! is the lock-guarded holder handed to the coordinator and search service.

use crate::types::{SearchOptions, DEFAULT_LOCALE};
use semsearch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Fields to extract for one content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeConfig {
    /// Content type identifier, e.g. `"blog.post"`.
    pub content_type: String,

    /// Field names whose values feed the embedding text, in order.
    pub fields: Vec<String>,

    /// Extra property names to skip inside nested values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_fields: Vec<String>,
}

impl ContentTypeConfig {
    /// Create a config for `content_type` extracting `fields`.
    pub fn new<I, S>(content_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content_type: content_type.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            excluded_fields: Vec::new(),
        }
    }

    /// Add property names the extractor must skip for this type.
    pub fn with_excluded_fields<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_fields.extend(keys.into_iter().map(Into::into));
        self
    }
}

/// Defaults applied to search requests that omit an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchDefaults {
    /// Default result limit.
    pub limit: usize,

    /// Default similarity threshold.
    pub threshold: f64,

    /// Default locale.
    pub locale: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            limit: options.limit,
            threshold: options.threshold,
            locale: options.locale,
        }
    }
}

/// Runtime settings for sync and search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    /// Generate embeddings on create/update events.
    pub auto_generate: bool,

    /// Indexed content types.
    pub content_types: Vec<ContentTypeConfig>,

    /// Search defaults.
    pub search: SearchDefaults,

    /// Records embedded concurrently by a regeneration job.
    pub regenerate_concurrency: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            auto_generate: false,
            content_types: Vec::new(),
            search: SearchDefaults::default(),
            regenerate_concurrency: 1,
        }
    }
}

impl EngineSettings {
    /// Config for `content_type`; the first declaration wins on duplicates.
    pub fn content_type(&self, content_type: &str) -> Option<&ContentTypeConfig> {
        self.content_types
            .iter()
            .find(|c| c.content_type == content_type)
    }

    /// Whether `content_type` is indexed.
    pub fn is_configured(&self, content_type: &str) -> bool {
        self.content_type(content_type).is_some()
    }

    /// Configured content type identifiers, deduplicated, in declaration order.
    pub fn content_type_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.content_types
            .iter()
            .filter(|c| seen.insert(c.content_type.as_str()))
            .map(|c| c.content_type.clone())
            .collect()
    }

    /// Check the configuration invariants.
    ///
    /// Empty identifiers and empty field lists are errors. Duplicate
    /// identifiers are only logged: the first declaration shadows the rest.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for config in &self.content_types {
            if config.content_type.trim().is_empty() {
                return Err(Error::config("content type identifier must not be empty"));
            }
            if config.fields.is_empty() {
                return Err(Error::config(format!(
                    "content type {} has no fields to extract",
                    config.content_type
                )));
            }
            if !seen.insert(config.content_type.as_str()) {
                log::warn!(
                    "Content type {} is configured more than once; the first entry is used",
                    config.content_type
                );
            }
        }
        if self.search.limit == 0 {
            return Err(Error::config("search limit must be positive"));
        }
        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(Error::config("search threshold must be within [0, 1]"));
        }
        Ok(())
    }

    /// Resolve per-request options against the defaults.
    ///
    /// A zero limit or a threshold outside `[0, 1]` (NaN included) is a
    /// validation error.
    pub fn resolve_options(
        &self,
        limit: Option<usize>,
        threshold: Option<f64>,
        locale: Option<&str>,
        domain: Option<&str>,
    ) -> Result<SearchOptions> {
        let limit = limit.unwrap_or(self.search.limit);
        if limit == 0 {
            return Err(Error::validation("limit must be a positive integer"));
        }
        let threshold = threshold.unwrap_or(self.search.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::validation("threshold must be within [0, 1]"));
        }

        let default_locale = if self.search.locale.is_empty() {
            DEFAULT_LOCALE
        } else {
            self.search.locale.as_str()
        };
        Ok(SearchOptions {
            limit,
            threshold,
            locale: locale
                .filter(|l| !l.is_empty())
                .unwrap_or(default_locale)
                .to_string(),
            domain: domain.filter(|d| !d.is_empty()).map(String::from),
        })
    }
}

/// Lock-guarded settings shared by the coordinator and the search service.
#[derive(Debug, Default)]
pub struct SharedSettings {
    inner: RwLock<EngineSettings>,
}

impl SharedSettings {
    /// Wrap initial settings.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// A copy of the current settings.
    pub async fn snapshot(&self) -> EngineSettings {
        self.inner.read().await.clone()
    }

    /// Replace the settings after validating them.
    pub async fn replace(&self, settings: EngineSettings) -> Result<()> {
        settings.validate()?;
        *self.inner.write().await = settings;
        Ok(())
    }

    /// Toggle automatic generation on lifecycle events.
    pub async fn set_auto_generate(&self, enabled: bool) {
        self.inner.write().await.auto_generate = enabled;
    }
}

// ============================================================================
// Tests
// ============================================================================
