//! Command-line interface for the semsearch engine.
//!
//! # Key Abstractions
//!
//! - [`SemsearchConfig`]: layered configuration (file, env, defaults)
//! - [`SemsearchApp`]: wires an engine context and dispatches commands
//! - [`CliArgs`]: clap argument tree

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod handlers;

pub use app::SemsearchApp;
pub use cli::{CliArgs, Command, ConfigAction};
pub use config::SemsearchConfig;
