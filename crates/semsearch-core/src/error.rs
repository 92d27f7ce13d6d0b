//! Error types for semsearch operations.
//!
//! A single `Error` enum covers every failure class the engine
//! distinguishes: configuration, validation, provider, persistence, and
//! plain I/O. Callers decide per class whether to surface or recover.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in semsearch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoPath {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error (missing API key, unconfigured content type, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation error (missing or malformed required fields).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Embedding provider failure.
    #[error("Provider error: {message}")]
    Provider {
        /// Human-readable description.
        message: String,
        /// Whether a retry may succeed (rate limits, 5xx, transport errors).
        retryable: bool,
    },

    /// Embedding store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Background task failure (panicked or cancelled).
    #[error("Task error: {0}")]
    Task(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a non-retryable provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create a provider error that a retry may resolve.
    pub fn provider_retryable(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a task error.
    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider {
                retryable: true,
                ..
            }
        )
    }

    /// Whether this error should be reported to a caller as a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using semsearch's Error type.
pub type Result<T> = std::result::Result<T, Error>;
