//! The semsearch CLI application.
//!
//! [`SemsearchApp`] owns the loaded configuration, wires an
//! [`EngineContext`] from it, and dispatches parsed commands to handlers.

use crate::cli::{CliArgs, Command};
use crate::config::{ProviderKind, SemsearchConfig, StoreBackend};
use crate::{config_handlers, handlers};
use semsearch_core::Result;
use semsearch_core::traits::ConfigProvider;
use semsearch_vector::{
    ContentSource, Embedder, EmbeddingStore, EngineContext, InMemoryContentSource,
    InMemoryEmbeddingStore, MockEmbeddingProvider, RedbEmbeddingStore, SharedSettings,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SemsearchApp
// ============================================================================

/// CLI application bound to one configuration.
pub struct SemsearchApp {
    name: String,
    config: Arc<SemsearchConfig>,
    version: String,
}

impl SemsearchApp {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = SemsearchConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create an application from an already loaded config.
    pub fn new(name: impl Into<String>, config: SemsearchConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &SemsearchConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Build the engine components described by the configuration.
    pub fn context(&self) -> Result<EngineContext> {
        let settings = self.config.engine_settings();
        settings.validate()?;

        let provider_settings = self.config.provider_settings();
        let embedder = match self.config.provider.kind {
            ProviderKind::OpenAi => Embedder::openai(provider_settings),
            ProviderKind::Mock => Embedder::with_provider(
                provider_settings,
                Arc::new(MockEmbeddingProvider::new(self.config.provider.mock_dimension)),
            ),
        };

        let store: Arc<dyn EmbeddingStore> = match self.config.store.backend {
            StoreBackend::Redb => {
                let path = self.config.store_path()?;
                tracing::debug!("Opening embedding store at {}", path.display());
                Arc::new(RedbEmbeddingStore::open(&path)?)
            }
            StoreBackend::Memory => Arc::new(InMemoryEmbeddingStore::new()),
        };

        let content_path = self.config.content_path()?;
        let content: Arc<dyn ContentSource> = if content_path.exists() {
            tracing::debug!("Loading content export from {}", content_path.display());
            Arc::new(InMemoryContentSource::from_json_file(&content_path)?)
        } else {
            tracing::warn!(
                "Content export {} not found, treating every content type as empty",
                content_path.display()
            );
            Arc::new(InMemoryContentSource::new())
        };

        Ok(EngineContext::new(
            Arc::new(SharedSettings::new(settings)),
            Arc::new(embedder),
            store,
            content,
        ))
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            Some(command) => handlers::handle_command(self.context()?, command).await,
            None => {
                println!("{} {}, use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
