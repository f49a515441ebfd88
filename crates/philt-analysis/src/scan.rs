//! Full-tree builder: walk the workspace, parse every source file, resolve
//! every import, populate the graph.
//!
//! Pipeline: a blocking walker task feeds file paths into a bounded channel;
//! a pool of workers reads and extracts imports; a single consumer owns the
//! graph and applies every record, so graph mutation needs no lock at all.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use philt_graph::ModuleGraph;

use crate::error::AnalysisError;
use crate::extract::parse_imports;
use crate::report::{BuildReport, UnresolvedImport};
use crate::resolver::{self, is_relative_spec, resolve_legacy, Resolution};

/// Directory names never descended into.
pub const PRUNED_DIRS: &[&str] = &["node_modules", "dist", "build"];

/// Channel capacity between pipeline stages.
const CHANNEL_CAPACITY: usize = 1024;

/// Extensions the legacy probe uses, mirrored here for diagnostics.
const LEGACY_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Options for the full-tree walk.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// File extensions treated as source files (lowercase, no dot).
    pub extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["ts".into(), "tsx".into()],
        }
    }
}

/// Whether a directory should be skipped during walks and watches.
pub fn is_pruned_dir_name(name: &str) -> bool {
    name.starts_with('.') || PRUNED_DIRS.contains(&name)
}

fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    extensions.iter().any(|e| *e == ext)
}

struct FileRecord {
    path: PathBuf,
    imports: Vec<String>,
}

/// Build the dependency graph for every source file under `root`.
///
/// Per-file read errors are skipped. Unresolved relative imports are
/// recorded in the report but never fail the build. On cancellation the
/// partial graph built so far is returned with `cancelled` set.
pub async fn build_graph(
    root: &Path,
    options: ScanOptions,
    cancel: &CancellationToken,
) -> Result<BuildReport, AnalysisError> {
    std::fs::metadata(root).map_err(|source| AnalysisError::WorkspaceRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let (path_tx, path_rx) = mpsc::channel::<PathBuf>(CHANNEL_CAPACITY);
    let (result_tx, mut result_rx) = mpsc::channel::<FileRecord>(CHANNEL_CAPACITY);

    // Walker: prune junk directories, emit matching files.
    let walker = {
        let root = root.to_path_buf();
        let extensions = options.extensions.clone();
        tokio::task::spawn_blocking(move || {
            let iter = WalkDir::new(&root).into_iter().filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                !entry
                    .file_name()
                    .to_str()
                    .is_some_and(is_pruned_dir_name)
            });
            for entry in iter.flatten() {
                if entry.file_type().is_file()
                    && has_source_extension(entry.path(), &extensions)
                    && path_tx.blocking_send(entry.into_path()).is_err()
                {
                    // Consumer went away; stop walking.
                    return;
                }
            }
        })
    };

    // Worker pool: read + extract.
    let path_rx = Arc::new(tokio::sync::Mutex::new(path_rx));
    let workers = num_cpus::get();
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let path_rx = Arc::clone(&path_rx);
        let result_tx = result_tx.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let path = { path_rx.lock().await.recv().await };
                let Some(path) = path else { break };
                if cancel.is_cancelled() {
                    break;
                }
                // Read errors skip the file without failing the build.
                let Ok(bytes) = tokio::fs::read(&path).await else {
                    tracing::debug!(path = %path.display(), "skipping unreadable file");
                    continue;
                };
                let imports = parse_imports(&String::from_utf8_lossy(&bytes));
                if result_tx.send(FileRecord { path, imports }).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(result_tx);

    // Single consumer owns the graph.
    let mut graph = ModuleGraph::new();
    let mut unresolved = Vec::new();
    let mut cancelled = false;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                cancelled = true;
                break;
            }
            record = result_rx.recv() => {
                let Some(record) = record else { break };
                consume_record(&mut graph, &mut unresolved, record);
            }
        }
    }
    drop(result_rx);

    for handle in handles {
        let _ = handle.await;
    }
    let _ = walker.await;

    Ok(BuildReport {
        graph,
        unresolved,
        cancelled,
    })
}

fn consume_record(
    graph: &mut ModuleGraph,
    unresolved: &mut Vec<UnresolvedImport>,
    record: FileRecord,
) {
    let file_id = record.path.to_string_lossy().into_owned();
    graph.touch(&file_id);

    for spec in record.imports {
        match resolve_legacy(&record.path, &spec) {
            Resolution::Local(to) => {
                graph.add_edge(&file_id, &to.to_string_lossy());
            }
            Resolution::External(pkg) => {
                graph.add_edge(&file_id, &format!("pkg:{pkg}"));
            }
            Resolution::Unresolved => {
                if is_relative_spec(&spec) {
                    let base = record.path.parent().unwrap_or_else(|| Path::new("."));
                    let candidate = base.join(&spec).clean();
                    let attempts = resolver::probe_attempts(&candidate, LEGACY_EXTENSIONS);
                    unresolved.push(UnresolvedImport {
                        file: record.path.clone(),
                        spec,
                        reason: format!(
                            "no file matched; tried {}",
                            attempts
                                .iter()
                                .map(|p| p.display().to_string())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    });
                }
            }
        }
    }
}
