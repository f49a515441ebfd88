//! philtographer CLI.
//!
//! Command-line surface over the graph engine in `philt-analysis`:
//!
//! - [`cli`] - clap argument definitions
//! - [`config`] - figment configuration merge (file, env, flags)
//! - `commands` - one module per subcommand
//! - [`server`] - the UI push server
//! - [`error`] - structured error types
//! - [`logger`] - tracing setup
//! - [`ui`] - terminal status helpers

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod server;
pub mod ui;

pub use error::{CliError, ConfigError, Result};
