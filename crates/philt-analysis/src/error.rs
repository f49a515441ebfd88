//! Error types for the analysis engine.
//!
//! Per-file read and parse failures are deliberately *not* errors: builders
//! skip those files and keep going. Only failures that prevent a build from
//! producing anything useful surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by entry discovery and builders.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The workspace root cannot be read at all.
    #[error("cannot access workspace root {}: {source}", .path.display())]
    WorkspaceRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry manifest named in the configuration cannot be read.
    #[error("failed to read entry manifest {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catch-all I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
