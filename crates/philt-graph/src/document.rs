//! Wire representation of graphs and change events.
//!
//! These are the two JSON documents the tool writes to disk and the UI
//! fetches. Shapes are stable: `nodes` is always sorted ascending, edge
//! keys are capitalized `From`/`To`, and edge order is unspecified.

use serde::{Deserialize, Serialize};

/// A single directed edge in the serialized graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
}

/// Serialized graph: sorted node list plus edge list.
///
/// `graphs` is only present in the watcher's affected-only mode, carrying
/// one induced subgraph per changed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphs: Option<Vec<RootedGraph>>,
}

/// Per-root entry of the affected-only document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootedGraph {
    pub root: String,
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

/// Serialized change event: what changed and what it transitively impacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    pub changed: Vec<String>,
    pub impacted: Vec<String>,
}

/// Normalize a node id for serialization: forward separators everywhere.
#[cfg(windows)]
pub(crate) fn wire_id(id: &str) -> String {
    id.replace('\\', "/")
}

#[cfg(not(windows))]
pub(crate) fn wire_id(id: &str) -> String {
    id.to_owned()
}

impl GraphDocument {
    /// Nodes whose in-degree and out-degree are both zero, sorted.
    pub fn isolated_nodes(&self) -> Vec<String> {
        use rustc_hash::FxHashSet;
        let mut connected: FxHashSet<&str> = FxHashSet::default();
        for edge in &self.edges {
            connected.insert(edge.from.as_str());
            connected.insert(edge.to.as_str());
        }
        let mut out: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| !connected.contains(n.as_str()))
            .cloned()
            .collect();
        out.sort_unstable();
        out
    }
}
