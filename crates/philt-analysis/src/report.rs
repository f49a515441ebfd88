//! Build results.

use std::fmt;
use std::path::PathBuf;

use philt_graph::ModuleGraph;

/// A relative import that could not be mapped to a file on disk.
///
/// Recorded and reported, never fatal: the build returns a partial graph.
#[derive(Debug, Clone)]
pub struct UnresolvedImport {
    /// The file containing the import.
    pub file: PathBuf,
    /// The raw module specifier.
    pub spec: String,
    /// Human-readable reason, including the candidates that were probed.
    pub reason: String,
}

impl fmt::Display for UnresolvedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: import {:?}: {}",
            self.file.display(),
            self.spec,
            self.reason
        )
    }
}

/// The outcome of a build: the graph (possibly partial), whatever could not
/// be resolved, and whether the build was cut short by cancellation.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub graph: ModuleGraph,
    pub unresolved: Vec<UnresolvedImport>,
    pub cancelled: bool,
}

impl BuildReport {
    pub fn new(graph: ModuleGraph) -> Self {
        Self {
            graph,
            unresolved: Vec::new(),
            cancelled: false,
        }
    }
}
