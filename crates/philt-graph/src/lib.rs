//! # philt-graph
//!
//! Pure graph data structures for file dependency graphs.
//!
//! This crate provides the [`ModuleGraph`] — a mutable directed graph over
//! string node ids with a maintained reverse index — without any I/O or
//! analysis logic. Node ids are either absolute file paths or external
//! package markers of the form `pkg:<specifier>`.
//!
//! The reverse index is what makes impact queries cheap: "if this file
//! changes, which files transitively import it?" is a walk over reverse
//! edges, not a scan of the whole graph.

mod document;

pub use document::{ChangeEvent, Edge, GraphDocument, RootedGraph};

use rustc_hash::{FxHashMap, FxHashSet};

/// Directed dependency graph with a maintained reverse adjacency index.
///
/// Invariants held by construction:
///
/// - every edge `(a, b)` present in the forward index is mirrored as
///   `a ∈ reverse[b]`, and vice versa;
/// - no self-loops, no empty-string endpoints;
/// - every node referenced by any edge has an entry (possibly empty) in
///   both indexes.
#[derive(Debug, Default, Clone)]
pub struct ModuleGraph {
    /// edges[a] is the set of nodes that `a` depends on.
    edges: FxHashMap<String, FxHashSet<String>>,
    /// reverse[b] is the set of nodes that import `b`.
    reverse: FxHashMap<String, FxHashSet<String>>,
}

impl ModuleGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the directed edge `from → to`.
    ///
    /// No-op when either endpoint is empty or the edge would be a
    /// self-loop. Idempotent: inserting the same edge twice leaves the
    /// graph unchanged.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from.is_empty() || to.is_empty() || from == to {
            return;
        }
        self.edges
            .entry(from.to_owned())
            .or_default()
            .insert(to.to_owned());
        self.reverse
            .entry(to.to_owned())
            .or_default()
            .insert(from.to_owned());
        // Both endpoints must exist as keys in both indexes.
        self.edges.entry(to.to_owned()).or_default();
        self.reverse.entry(from.to_owned()).or_default();
    }

    /// Ensure `node` exists in both indexes, with empty buckets if it has
    /// no edges yet. Idempotent; empty ids are ignored.
    pub fn touch(&mut self, node: &str) {
        if node.is_empty() {
            return;
        }
        self.edges.entry(node.to_owned()).or_default();
        self.reverse.entry(node.to_owned()).or_default();
    }

    /// All unique nodes, sorted lexicographically.
    pub fn nodes(&self) -> Vec<String> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for node in self.edges.keys().chain(self.reverse.keys()) {
            seen.insert(node);
        }
        let mut out: Vec<String> = seen.into_iter().map(str::to_owned).collect();
        out.sort_unstable();
        out
    }

    /// Number of unique nodes.
    pub fn node_count(&self) -> usize {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for node in self.edges.keys().chain(self.reverse.keys()) {
            seen.insert(node);
        }
        seen.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(FxHashSet::len).sum()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.reverse.is_empty()
    }

    /// Whether `node` is present in the graph.
    pub fn contains(&self, node: &str) -> bool {
        self.edges.contains_key(node) || self.reverse.contains_key(node)
    }

    /// All nodes that directly or indirectly depend on `start`, sorted.
    ///
    /// Walks the reverse index with an explicit stack so that graphs with
    /// hundreds of thousands of nodes cannot overflow the call stack.
    /// `start` itself is excluded; an unknown `start` yields an empty set.
    pub fn impacted(&self, start: &str) -> Vec<String> {
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut stack: Vec<&str> = vec![start];
        while let Some(node) = stack.pop() {
            let Some(preds) = self.reverse.get(node) else {
                continue;
            };
            for pred in preds {
                if visited.insert(pred.as_str()) {
                    stack.push(pred);
                }
            }
        }
        // `start` is only in the result if it sits on a cycle back to itself;
        // the query is about *other* files, so drop it either way.
        visited.remove(start);
        let mut out: Vec<String> = visited.into_iter().map(str::to_owned).collect();
        out.sort_unstable();
        out
    }

    /// Visit every directed edge exactly once. Order is unspecified.
    pub fn for_each_edge<F: FnMut(&str, &str)>(&self, mut f: F) {
        for (from, tos) in &self.edges {
            for to in tos {
                f(from, to);
            }
        }
    }

    /// Snapshot the graph into its wire representation.
    pub fn to_document(&self) -> GraphDocument {
        let mut edges = Vec::with_capacity(self.edge_count());
        self.for_each_edge(|from, to| {
            edges.push(Edge {
                from: document::wire_id(from),
                to: document::wire_id(to),
            });
        });
        GraphDocument {
            nodes: self.nodes().iter().map(|n| document::wire_id(n)).collect(),
            edges,
            graphs: None,
        }
    }

    /// Induced subgraph over `keep`: the kept nodes plus every edge whose
    /// endpoints are both kept.
    pub fn filter_subgraph(&self, keep: &FxHashSet<String>) -> GraphDocument {
        let mut nodes: Vec<String> = keep.iter().map(|n| document::wire_id(n)).collect();
        nodes.sort_unstable();
        let mut edges = Vec::new();
        self.for_each_edge(|from, to| {
            if keep.contains(from) && keep.contains(to) {
                edges.push(Edge {
                    from: document::wire_id(from),
                    to: document::wire_id(to),
                });
            }
        });
        GraphDocument {
            nodes,
            edges,
            graphs: None,
        }
    }
}

impl serde::Serialize for ModuleGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}
