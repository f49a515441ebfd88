//! `watch`: incremental rebuilds under a filesystem watcher.
//!
//! State machine: Idle → Batching (debounce timer armed) → Rebuilding →
//! Idle. Events are filtered to source files outside the pruned
//! directories, collected into a pending set, and flushed 300 ms after the
//! last event. Each flush rebuilds the graph, computes the impacted set of
//! the batch, and writes both output documents. Build failures are logged
//! and never stop the loop; the events document is written regardless.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use notify::{RecursiveMode, Watcher};
use path_clean::PathClean;
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;

use philt_analysis::{
    build_component_graph, build_graph, build_providers, discover_entries, fallback_root_entry,
    scan::is_pruned_dir_name, EntrySpec, Resolver, ScanOptions,
};
use philt_graph::{ChangeEvent, GraphDocument, ModuleGraph, RootedGraph};

use crate::cli::{WatchArgs, WatchMode};
use crate::commands::{absolutize, write_json_file, CommandContext};
use crate::error::Result;
use crate::ui;

/// Quiesce window after the last filesystem event.
const DEBOUNCE: Duration = Duration::from_millis(300);

pub async fn execute(ctx: &CommandContext, args: WatchArgs) -> Result<()> {
    let graph_path = absolutize(&args.graph)?;
    let events_path = match &args.events {
        Some(path) => absolutize(path)?,
        None => graph_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("events.json"),
    };

    let driver = RebuildDriver {
        mode: args.mode,
        root: ctx.root.clone(),
        entries: ctx.config.entries.clone(),
        affected_only: args.affected_only,
        graph_path,
        events_path,
    };

    // Initial full build; a failure to write any output here is fatal.
    driver.rebuild(&[]).await?;

    // Recursive watcher over the workspace, plus alias target directories
    // the tsconfig points at outside the root.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<PathBuf>(256);
    let watch_root = ctx.root.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        for path in &event.paths {
            if is_watched_file(path) && !in_pruned_dir(&watch_root, path) {
                let _ = event_tx.blocking_send(path.clean());
            }
        }
    })?;
    watcher.watch(&ctx.root, RecursiveMode::Recursive)?;
    for dir in Resolver::new(&ctx.root).watch_dirs() {
        if !dir.starts_with(&ctx.root) && dir.is_dir() {
            if let Err(err) = watcher.watch(&dir, RecursiveMode::Recursive) {
                tracing::debug!(dir = %dir.display(), %err, "cannot watch alias target");
            }
        }
    }

    ui::info(&format!("watching {}", ctx.root.display()));

    let mut pending: FxHashSet<PathBuf> = FxHashSet::default();
    let sleep = tokio::time::sleep(DEBOUNCE);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            Some(path) = event_rx.recv() => {
                pending.insert(path);
                sleep.as_mut().reset(tokio::time::Instant::now() + DEBOUNCE);
            }
            () = &mut sleep, if !pending.is_empty() => {
                let mut changed: Vec<PathBuf> = pending.drain().collect();
                changed.sort_unstable();
                if let Err(err) = driver.rebuild(&changed).await {
                    ui::error(&format!("rebuild failed: {err}"));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                ui::info("stopping watcher");
                break;
            }
        }
    }
    Ok(())
}

/// Source file suffixes the watcher reacts to.
fn is_watched_file(path: &Path) -> bool {
    let lower = path.to_string_lossy().to_ascii_lowercase();
    [".ts", ".tsx", ".js", ".jsx"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}

/// Whether `path` sits under a pruned directory relative to `root`.
fn in_pruned_dir(root: &Path, path: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        // Alias targets outside the root are watched deliberately.
        return false;
    };
    let mut components: Vec<_> = rel.components().collect();
    // The file name itself is not subject to directory pruning.
    components.pop();
    components.iter().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(is_pruned_dir_name)
    })
}

/// Rebuilds the configured graph and writes the two output documents.
struct RebuildDriver {
    mode: WatchMode,
    root: PathBuf,
    entries: Vec<EntrySpec>,
    affected_only: bool,
    graph_path: PathBuf,
    events_path: PathBuf,
}

impl RebuildDriver {
    /// One rebuild cycle. Build errors are logged and swallowed so the
    /// watch loop survives them; failures to write output are returned.
    async fn rebuild(&self, changed: &[PathBuf]) -> Result<()> {
        let graph = match self.build().await {
            Ok(graph) => Some(graph),
            Err(err) => {
                ui::error(&format!("build error: {err}"));
                None
            }
        };

        let impacted = graph
            .as_ref()
            .map(|g| impacted_for_changes(g, changed))
            .unwrap_or_default();

        if let Some(graph) = &graph {
            let document = if self.affected_only && !changed.is_empty() {
                affected_document(graph, changed, &impacted)
            } else {
                graph.to_document()
            };
            write_json_file(&self.graph_path, &document)?;
        }

        // The events document goes out even when the build failed.
        let event = ChangeEvent {
            ts: now_millis(),
            changed: changed
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            impacted,
        };
        write_json_file(&self.events_path, &event)?;
        Ok(())
    }

    async fn build(&self) -> Result<ModuleGraph> {
        match self.mode {
            WatchMode::Scan => {
                let report = build_graph(
                    &self.root,
                    ScanOptions::default(),
                    &CancellationToken::new(),
                )
                .await?;
                if !report.unresolved.is_empty() {
                    tracing::debug!(
                        count = report.unresolved.len(),
                        "unresolved imports in watch rebuild"
                    );
                }
                Ok(report.graph)
            }
            WatchMode::Components => {
                let providers = build_providers(&self.entries);
                let mut entry_paths: Vec<_> = discover_entries(&providers, &self.root)?
                    .into_iter()
                    .map(|entry| entry.path)
                    .collect();
                if entry_paths.is_empty() {
                    entry_paths.push(fallback_root_entry(&self.root));
                }
                let report = build_component_graph(
                    &self.root,
                    &entry_paths,
                    &CancellationToken::new(),
                    None,
                )
                .await;
                Ok(report.graph)
            }
        }
    }
}

/// Union of `Impacted(c)` over the changed batch, de-duplicated and sorted.
fn impacted_for_changes(graph: &ModuleGraph, changed: &[PathBuf]) -> Vec<String> {
    let mut union: std::collections::BTreeSet<String> = Default::default();
    for path in changed {
        let id = path.clean().to_string_lossy().into_owned();
        union.extend(graph.impacted(&id));
    }
    union.into_iter().collect()
}

/// The affected-only graph document: the induced subgraph over
/// changed ∪ impacted, with one rooted subgraph per changed file.
fn affected_document(
    graph: &ModuleGraph,
    changed: &[PathBuf],
    impacted: &[String],
) -> GraphDocument {
    let changed_ids: Vec<String> = changed
        .iter()
        .map(|p| p.clean().to_string_lossy().into_owned())
        .collect();

    let mut keep: FxHashSet<String> = changed_ids.iter().cloned().collect();
    keep.extend(impacted.iter().cloned());
    let mut document = graph.filter_subgraph(&keep);

    let rooted = changed_ids
        .iter()
        .map(|root_id| {
            let mut keep: FxHashSet<String> = graph.impacted(root_id).into_iter().collect();
            keep.insert(root_id.clone());
            let sub = graph.filter_subgraph(&keep);
            RootedGraph {
                root: root_id.clone(),
                nodes: sub.nodes,
                edges: sub.edges,
            }
        })
        .collect();
    document.graphs = Some(rooted);
    document
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn watched_file_suffixes() {
        assert!(is_watched_file(Path::new("/w/a.ts")));
        assert!(is_watched_file(Path::new("/w/a.tsx")));
        assert!(is_watched_file(Path::new("/w/a.js")));
        assert!(is_watched_file(Path::new("/w/a.jsx")));
        assert!(is_watched_file(Path::new("/w/types.d.ts")));
        assert!(!is_watched_file(Path::new("/w/a.css")));
        assert!(!is_watched_file(Path::new("/w/README.md")));
    }

    #[test]
    fn pruned_dirs_are_filtered_by_component() {
        let root = Path::new("/workspace");
        assert!(in_pruned_dir(root, Path::new("/workspace/node_modules/x/index.ts")));
        assert!(in_pruned_dir(root, Path::new("/workspace/.git/hook.ts")));
        assert!(in_pruned_dir(root, Path::new("/workspace/dist/out.js")));
        assert!(in_pruned_dir(root, Path::new("/workspace/a/build/out.js")));
        assert!(!in_pruned_dir(root, Path::new("/workspace/src/app.ts")));
        // Dotfiles are not pruned; only dot-directories are.
        assert!(!in_pruned_dir(root, Path::new("/workspace/.eslintrc.js")));
        // Paths outside the root (alias targets) are never pruned.
        assert!(!in_pruned_dir(root, Path::new("/elsewhere/lib/index.ts")));
    }

    #[test]
    fn impacted_union_is_deduplicated_and_sorted() {
        let mut graph = ModuleGraph::new();
        graph.add_edge("/w/a.ts", "/w/b.ts");
        graph.add_edge("/w/b.ts", "/w/c.ts");
        graph.add_edge("/w/a.ts", "/w/d.ts");

        let impacted = impacted_for_changes(
            &graph,
            &[PathBuf::from("/w/c.ts"), PathBuf::from("/w/d.ts")],
        );
        assert_eq!(impacted, vec!["/w/a.ts", "/w/b.ts"]);
    }

    #[test]
    fn affected_document_contains_rooted_subgraphs() {
        let mut graph = ModuleGraph::new();
        graph.add_edge("/w/a.ts", "/w/b.ts");
        graph.add_edge("/w/b.ts", "/w/c.ts");
        graph.add_edge("/w/x.ts", "/w/y.ts");

        let changed = vec![PathBuf::from("/w/c.ts")];
        let impacted = impacted_for_changes(&graph, &changed);
        let document = affected_document(&graph, &changed, &impacted);

        assert_eq!(document.nodes, vec!["/w/a.ts", "/w/b.ts", "/w/c.ts"]);
        assert!(!document.nodes.contains(&"/w/x.ts".to_string()));
        let rooted = document.graphs.unwrap();
        assert_eq!(rooted.len(), 1);
        assert_eq!(rooted[0].root, "/w/c.ts");
        assert_eq!(rooted[0].nodes.len(), 3);
    }

    #[tokio::test]
    async fn rebuild_writes_graph_and_event_documents() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.ts", "import './b';");
        write(dir.path(), "b.ts", "import './c';");
        let c = write(dir.path(), "c.ts", "export const x = 1;");

        let out = TempDir::new().unwrap();
        let driver = RebuildDriver {
            mode: WatchMode::Scan,
            root: dir.path().to_path_buf(),
            entries: Vec::new(),
            affected_only: false,
            graph_path: out.path().join("graph.json"),
            events_path: out.path().join("events.json"),
        };

        // Initial build: empty change set, empty impacted.
        driver.rebuild(&[]).await.unwrap();
        let event: ChangeEvent =
            serde_json::from_slice(&fs::read(out.path().join("events.json")).unwrap()).unwrap();
        assert!(event.changed.is_empty());
        assert!(event.impacted.is_empty());

        // A change to c impacts both a and b.
        driver.rebuild(std::slice::from_ref(&c)).await.unwrap();
        let event: ChangeEvent =
            serde_json::from_slice(&fs::read(out.path().join("events.json")).unwrap()).unwrap();
        assert!(event.ts > 0);
        assert_eq!(event.changed, vec![c.to_string_lossy().into_owned()]);
        assert!(event
            .impacted
            .contains(&a.to_string_lossy().into_owned()));
        assert_eq!(event.impacted.len(), 2);

        let graph: GraphDocument =
            serde_json::from_slice(&fs::read(out.path().join("graph.json")).unwrap()).unwrap();
        assert_eq!(graph.nodes.len(), 3);
    }

    #[tokio::test]
    async fn affected_only_rebuild_writes_subgraph() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.ts", "import './b';");
        let b = write(dir.path(), "b.ts", "export const b = 1;");
        write(dir.path(), "island.ts", "export const i = 1;");

        let out = TempDir::new().unwrap();
        let driver = RebuildDriver {
            mode: WatchMode::Scan,
            root: dir.path().to_path_buf(),
            entries: Vec::new(),
            affected_only: true,
            graph_path: out.path().join("graph.json"),
            events_path: out.path().join("events.json"),
        };

        driver.rebuild(std::slice::from_ref(&b)).await.unwrap();
        let graph: GraphDocument =
            serde_json::from_slice(&fs::read(out.path().join("graph.json")).unwrap()).unwrap();
        assert_eq!(graph.nodes.len(), 2, "{:?}", graph.nodes);
        assert!(!graph.nodes.iter().any(|n| n.ends_with("island.ts")));
        assert!(graph.graphs.is_some());
    }

    #[tokio::test]
    async fn build_errors_still_write_event_document() {
        let out = TempDir::new().unwrap();
        let driver = RebuildDriver {
            mode: WatchMode::Scan,
            root: PathBuf::from("/definitely/not/here"),
            entries: Vec::new(),
            affected_only: false,
            graph_path: out.path().join("graph.json"),
            events_path: out.path().join("events.json"),
        };

        driver.rebuild(&[PathBuf::from("/x/y.ts")]).await.unwrap();
        assert!(!out.path().join("graph.json").exists());
        let event: ChangeEvent =
            serde_json::from_slice(&fs::read(out.path().join("events.json")).unwrap()).unwrap();
        assert!(event.impacted.is_empty());
        assert_eq!(event.changed.len(), 1);
    }
}
