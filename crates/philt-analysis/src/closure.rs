//! Entry-driven builder: walk only the reachable import closure from a seed
//! set of entry files.
//!
//! Better suited to multi-root applications than the full-tree scan, and
//! much faster on large repositories where most files are unreachable from
//! the roots anyone cares about. Uses the shared work-queue protocol from
//! [`crate::queue`] for cycle-safe termination.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use path_clean::PathClean;
use tokio_util::sync::CancellationToken;

use philt_graph::ModuleGraph;

use crate::entries::Entry;
use crate::extract::extract_imports;
use crate::queue::WorkQueue;
use crate::report::BuildReport;
use crate::resolver::{Resolution, Resolver};

/// Build the reachable closure from `entries`.
///
/// Externals contribute `pkg:` nodes but are not traversed. Files that fail
/// to read are skipped silently. On cancellation workers drain the queue
/// without processing, keeping the termination invariant intact, and the
/// partial graph is returned.
pub async fn build_graph_from_entries(
    root: &Path,
    entries: &[Entry],
    cancel: &CancellationToken,
) -> BuildReport {
    let graph = Arc::new(Mutex::new(ModuleGraph::new()));
    let resolver = Arc::new(Resolver::new(root));
    let queue = Arc::new(WorkQueue::new());

    for entry in entries {
        let path = if entry.path.is_absolute() {
            entry.path.clean()
        } else {
            root.join(&entry.path).clean()
        };
        queue.enqueue(crate::resolver::probe_seed(path));
    }
    queue.close_if_idle();

    let workers = num_cpus::get();
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let graph = Arc::clone(&graph);
        let resolver = Arc::clone(&resolver);
        let queue = Arc::clone(&queue);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            while let Some(path) = queue.next().await {
                if !cancel.is_cancelled() {
                    visit(&graph, &resolver, &queue, &path).await;
                }
                queue.complete_one();
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    let graph = Arc::try_unwrap(graph)
        .map(Mutex::into_inner)
        .unwrap_or_else(|shared| shared.lock().clone());
    BuildReport {
        graph,
        unresolved: Vec::new(),
        cancelled: cancel.is_cancelled(),
    }
}

async fn visit(
    graph: &Mutex<ModuleGraph>,
    resolver: &Resolver,
    queue: &WorkQueue,
    path: &PathBuf,
) {
    let Ok(bytes) = tokio::fs::read(path).await else {
        tracing::debug!(path = %path.display(), "skipping unreadable file");
        return;
    };
    let file_id = path.to_string_lossy().into_owned();
    graph.lock().touch(&file_id);

    for spec in extract_imports(path, &bytes) {
        match resolver.resolve(path, &spec) {
            Resolution::Local(to) => {
                graph.lock().add_edge(&file_id, &to.to_string_lossy());
                // The probe only returns existing regular files, so every
                // local hit is a valid traversal target.
                queue.enqueue(to);
            }
            Resolution::External(pkg) => {
                graph.lock().add_edge(&file_id, &format!("pkg:{pkg}"));
            }
            Resolution::Unresolved => {
                tracing::debug!(
                    from = %path.display(),
                    spec,
                    "unresolved import in closure walk"
                );
            }
        }
    }
}
