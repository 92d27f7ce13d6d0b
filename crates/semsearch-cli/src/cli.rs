//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use semsearch_vector::LifecycleKind;

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "semsearch", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "SEMSEARCH_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search one content type by meaning.
    Search {
        /// Free-text query.
        query: String,

        /// Content type to search.
        #[arg(short = 't', long)]
        content_type: String,

        /// Maximum results.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score.
        #[arg(long)]
        threshold: Option<f64>,

        /// Locale of candidate records.
        #[arg(long)]
        locale: Option<String>,

        /// Only keep records whose `domain` field equals this value.
        #[arg(long)]
        domain: Option<String>,
    },

    /// Search several content types and merge the results.
    MultiSearch {
        /// Free-text query.
        query: String,

        /// Content types to search (repeatable); all configured types if omitted.
        #[arg(short = 't', long = "content-type")]
        content_types: Vec<String>,

        /// Maximum merged results.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score.
        #[arg(long)]
        threshold: Option<f64>,

        /// Locale of candidate records.
        #[arg(long)]
        locale: Option<String>,

        /// Only keep records whose `domain` field equals this value.
        #[arg(long)]
        domain: Option<String>,
    },

    /// Re-embed every published record of a content type.
    Regenerate {
        /// Content type to regenerate.
        content_type: String,

        /// Locale to regenerate.
        #[arg(long)]
        locale: Option<String>,
    },

    /// Delete every embedding of a content type.
    Delete {
        /// Content type to clear.
        content_type: String,
    },

    /// Show embedding coverage per configured content type.
    Stats,

    /// Replay a lifecycle event for one record.
    Sync {
        /// Event kind.
        #[arg(value_enum)]
        event: EventArg,

        /// Content type of the record.
        content_type: String,

        /// JSON file holding the record.
        record: String,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Lifecycle event kinds accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EventArg {
    /// Record created.
    Created,
    /// Record updated or published.
    Updated,
    /// Record deleted.
    Deleted,
}

impl From<EventArg> for LifecycleKind {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Created => Self::Created,
            EventArg::Updated => Self::Updated,
            EventArg::Deleted => Self::Deleted,
        }
    }
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration with secrets masked.
    Show,

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
