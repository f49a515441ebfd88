//! # philt-analysis
//!
//! The graph engine: concurrent source discovery, import extraction, module
//! resolution, and the three builders that turn a TypeScript/JavaScript tree
//! into a [`philt_graph::ModuleGraph`].
//!
//! Three ways to build a graph:
//!
//! - [`scan::build_graph`] walks the whole workspace in parallel and records
//!   every import edge it can resolve.
//! - [`closure::build_graph_from_entries`] starts from a set of entry files
//!   and only visits the reachable import closure, which is much faster on
//!   large multi-root repositories.
//! - [`components::build_component_graph`] is the JSX-aware variant: it only
//!   follows imports whose binding actually appears as a JSX tag head, giving
//!   a render-relationship graph rather than a plain import graph.
//!
//! All builders accept a cancellation token and return the partial graph on
//! cancellation rather than discarding work.

pub mod closure;
pub mod components;
pub mod entries;
pub mod error;
pub mod extract;
mod queue;
pub mod report;
pub mod resolver;
pub mod scan;

pub use closure::build_graph_from_entries;
pub use components::{build_component_graph, parse_file_info, FileInfo};
pub use entries::{
    build_providers, discover_entries, fallback_root_entry, Entry, EntryProvider, EntrySpec,
    ExplicitProvider, NameFrom, RootsManifestProvider,
};
pub use error::AnalysisError;
pub use extract::{extract_imports, parse_imports, parse_imports_ast};
pub use report::{BuildReport, UnresolvedImport};
pub use resolver::{resolve_legacy, Resolution, Resolver};
pub use scan::{build_graph, ScanOptions};
