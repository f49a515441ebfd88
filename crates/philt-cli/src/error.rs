//! Error handling for the philtographer CLI.
//!
//! A hierarchical error type system using `thiserror`: broad categories at
//! the top level, configuration problems split out so they can carry hints.
//! Recoverable per-file problems never reach these types — builders report
//! them in-band and the commands log them.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration problems: malformed documents, bad field values.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failures from the analysis engine.
    #[error("Build error: {0}")]
    Analysis(#[from] philt_analysis::AnalysisError),

    /// Invalid command-line arguments or options.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required file or directory is missing.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UI server failures.
    #[error("Server error: {0}")]
    Server(String),

    /// File watching failures.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// JSON serialization/deserialization failures.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A build was cancelled for a reason other than the user asking.
    #[error("Build cancelled: {0}")]
    BuildCancelled(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file doesn't exist.
    #[error("Config file not found: {}\n\nHint: check the --config path", .0.display())]
    NotFound(PathBuf),

    /// The config file extension is not one of json/yaml/toml.
    #[error("Unsupported config format: {}\n\nHint: use philtographer.config.json, .yaml, or .toml", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The config document failed to parse or merge.
    #[error("Invalid configuration: {reason}\n\nHint: {hint}")]
    Invalid { reason: String, hint: String },

    /// A required field is missing for the requested command.
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField { field: String, hint: String },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Convert a CLI error into a miette report for terminal rendering.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Config(e) => miette::miette!("{}", e),
        other => miette::miette!("{}", other),
    }
}
