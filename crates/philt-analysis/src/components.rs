//! JSX-aware component graph.
//!
//! A variant of the closure walk that only follows imports actually used as
//! JSX tags. Per file, a tree-sitter parse produces the import map (local
//! binding → raw specifier) and the JSX tag head identifiers; an edge is
//! added only when a JSX identifier maps through an import to a local file.
//! Intrinsic tags (`<div>`), locally declared components, and member tags
//! whose head is not an imported binding produce no edges.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;
use tree_sitter::{Node, Parser};

use philt_graph::ModuleGraph;

use crate::extract::{language_for, node_text};
use crate::queue::WorkQueue;
use crate::report::BuildReport;
use crate::resolver::{self, is_path_spec};

/// Extension order for component resolution: TSX first, plain JS last so
/// `.jsx` component files resolve from extensionless specifiers.
const COMPONENT_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js"];

/// Extracted symbols for one TS/TSX file.
#[derive(Debug, Default, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    /// Capitalized top-level declarations (informational).
    pub components: Vec<String>,
    /// Local binding name → raw module specifier. Namespace bindings map
    /// as a whole to the module.
    pub import_map: FxHashMap<String, String>,
    /// JSX tag head identifiers in encounter order; `<Foo.Bar/>` records
    /// `Foo`, intrinsic tags record their lowercase name.
    pub jsx_identifiers: Vec<String>,
}

/// Progress snapshot receiver: `(visited, edges, queued)`.
pub type ProgressFn = Arc<dyn Fn(usize, usize, usize) + Send + Sync>;

/// Parse one file into its [`FileInfo`]. `None` when the parse fails.
pub fn parse_file_info(path: &Path, content: &[u8]) -> Option<FileInfo> {
    let mut parser = Parser::new();
    parser.set_language(language_for(path)).ok()?;
    let tree = parser.parse(content, None)?;

    let mut info = FileInfo {
        path: path.to_path_buf(),
        ..FileInfo::default()
    };
    walk(tree.root_node(), content, &mut info);
    Some(info)
}

fn walk(node: Node<'_>, src: &[u8], info: &mut FileInfo) {
    match node.kind() {
        "import_statement" => collect_import(node, src, info),
        "function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                push_component(info, node_text(src, name));
            }
        }
        "lexical_declaration" => {
            for i in 0..node.named_child_count() {
                let child = node.named_child(i).unwrap();
                if child.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = child.child_by_field_name("name") {
                    if name.kind() == "identifier" {
                        push_component(info, node_text(src, name));
                    }
                }
            }
        }
        "jsx_opening_element" | "jsx_self_closing_element" => {
            if let Some(head) = jsx_head_identifier(node, src) {
                info.jsx_identifiers.push(head.to_owned());
            }
        }
        _ => {}
    }
    for i in 0..node.named_child_count() {
        walk(node.named_child(i).unwrap(), src, info);
    }
}

fn push_component(info: &mut FileInfo, name: &str) {
    if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        info.components.push(name.to_owned());
    }
}

fn collect_import(node: Node<'_>, src: &[u8], info: &mut FileInfo) {
    let mut module = String::new();
    for i in 0..node.named_child_count() {
        let child = node.named_child(i).unwrap();
        if child.kind() == "string" {
            module = node_text(src, child)
                .trim_matches(|c| c == '\'' || c == '"')
                .to_owned();
        }
    }
    if module.is_empty() {
        return;
    }
    let Some(clause) = named_child_of_kind(node, "import_clause") else {
        return;
    };
    for i in 0..clause.named_child_count() {
        let binding = clause.named_child(i).unwrap();
        match binding.kind() {
            // Default import: `import Foo from "x"`.
            "identifier" => {
                info.import_map
                    .insert(node_text(src, binding).to_owned(), module.clone());
            }
            // `import * as NS from "x"` binds the whole module to NS.
            "namespace_import" => {
                if let Some(name) = first_identifier(binding, src) {
                    info.import_map.insert(name.to_owned(), module.clone());
                }
            }
            "named_imports" => {
                for j in 0..binding.named_child_count() {
                    let spec = binding.named_child(j).unwrap();
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    // `A as B` binds B; plain `A` binds A.
                    let local = spec
                        .child_by_field_name("alias")
                        .or_else(|| spec.child_by_field_name("name"));
                    if let Some(local) = local {
                        info.import_map
                            .insert(node_text(src, local).to_owned(), module.clone());
                    }
                }
            }
            _ => {}
        }
    }
}

fn named_child_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .find(|c| c.kind() == kind)
}

/// The leading identifier of a JSX element name: `<Foo.Bar.Baz/>` → `Foo`.
fn jsx_head_identifier<'a>(node: Node<'_>, src: &'a [u8]) -> Option<&'a str> {
    if let Some(name) = node.child_by_field_name("name") {
        return first_identifier(name, src);
    }
    first_identifier(node, src)
}

fn first_identifier<'a>(node: Node<'_>, src: &'a [u8]) -> Option<&'a str> {
    if matches!(node.kind(), "identifier" | "jsx_identifier") {
        return Some(node_text(src, node));
    }
    for i in 0..node.named_child_count() {
        if let Some(found) = first_identifier(node.named_child(i).unwrap(), src) {
            return Some(found);
        }
    }
    None
}

/// Map a JSX identifier to a file via the import map.
///
/// Only relative and absolute specifiers can resolve; bare package imports
/// and unknown bindings yield `None`.
pub fn resolve_imported_component(
    current_file: &Path,
    import_map: &FxHashMap<String, String>,
    ident: &str,
) -> Option<PathBuf> {
    let module = import_map.get(ident)?;
    if !is_path_spec(module) {
        return None;
    }
    let base = current_file.parent().unwrap_or_else(|| Path::new("."));
    resolver::probe(&base.join(module).clean(), COMPONENT_EXTENSIONS)
}

/// Build the component graph reachable from `entries`.
///
/// Same worker pool, visited set, and inflight termination as the entry
/// builder. `progress` (if supplied) receives `(visited, edges, queued)`
/// snapshots after every processed file; callers are expected to rate-limit
/// what they print.
pub async fn build_component_graph(
    root: &Path,
    entries: &[PathBuf],
    cancel: &CancellationToken,
    progress: Option<ProgressFn>,
) -> BuildReport {
    let graph = Arc::new(Mutex::new(ModuleGraph::new()));
    let queue = Arc::new(WorkQueue::new());
    let visited = Arc::new(AtomicUsize::new(0));
    let edges = Arc::new(AtomicUsize::new(0));

    for entry in entries {
        let path = if entry.is_absolute() {
            entry.clean()
        } else {
            root.join(entry).clean()
        };
        queue.enqueue(resolver::probe_seed(path));
    }
    queue.close_if_idle();

    let workers = num_cpus::get();
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let graph = Arc::clone(&graph);
        let queue = Arc::clone(&queue);
        let visited = Arc::clone(&visited);
        let edges = Arc::clone(&edges);
        let progress = progress.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            while let Some(path) = queue.next().await {
                if !cancel.is_cancelled() {
                    visit(&graph, &queue, &visited, &edges, &path).await;
                    if let Some(progress) = &progress {
                        progress(
                            visited.load(Ordering::Relaxed),
                            edges.load(Ordering::Relaxed),
                            queue.enqueued_count(),
                        );
                    }
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
    queue: &WorkQueue,
    visited: &AtomicUsize,
    edges: &AtomicUsize,
    path: &PathBuf,
) {
    let Ok(bytes) = tokio::fs::read(path).await else {
        return;
    };
    let Some(info) = parse_file_info(path, &bytes) else {
        return;
    };

    let file_id = path.to_string_lossy().into_owned();
    graph.lock().touch(&file_id);
    visited.fetch_add(1, Ordering::Relaxed);

    for ident in &info.jsx_identifiers {
        if let Some(to) = resolve_imported_component(path, &info.import_map, ident) {
            graph.lock().add_edge(&file_id, &to.to_string_lossy());
            edges.fetch_add(1, Ordering::Relaxed);
            queue.enqueue(to);
        }
    }
}
