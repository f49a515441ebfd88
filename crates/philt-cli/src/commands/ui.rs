//! `ui`: serve the visualization front-end with live update push.

use std::path::Path;

use crate::cli::UiArgs;
use crate::commands::absolutize;
use crate::error::{CliError, Result};
use crate::server;
use crate::ui;

pub async fn execute(args: UiArgs) -> Result<()> {
    let graph_path = absolutize(&args.graph)?;

    // Validate the graph document up front for fast feedback.
    let bytes =
        std::fs::read(&graph_path).map_err(|_| CliError::FileNotFound(graph_path.clone()))?;
    serde_json::from_slice::<serde_json::Value>(&bytes)
        .map_err(|e| CliError::Server(format!("invalid graph JSON: {e}")))?;

    let events_path = match &args.events {
        Some(path) => absolutize(path)?,
        None => default_events_path(&graph_path),
    };

    ui::info(&format!(
        "graph: {}, events: {}",
        graph_path.display(),
        events_path.display()
    ));

    let state = server::UiState::new(graph_path, events_path);
    // Held for the lifetime of the server; dropping it stops notifications.
    let _watcher = server::start_document_watcher(state.clone())?;
    server::serve(&args.addr, state).await
}

/// `graph.json` → `graph-events.json` next to it.
fn default_events_path(graph_path: &Path) -> std::path::PathBuf {
    let stem = graph_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("graph");
    graph_path.with_file_name(format!("{stem}-events.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_events_path_is_sibling() {
        assert_eq!(
            default_events_path(Path::new("/out/graph.json")),
            PathBuf::from("/out/graph-events.json")
        );
    }

    #[tokio::test]
    async fn missing_graph_file_errors() {
        let result = execute(UiArgs {
            addr: "127.0.0.1:0".into(),
            graph: "/no/such/graph.json".into(),
            events: None,
        })
        .await;
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn invalid_graph_json_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "not json").unwrap();
        let result = execute(UiArgs {
            addr: "127.0.0.1:0".into(),
            graph: path,
            events: None,
        })
        .await;
        assert!(matches!(result, Err(CliError::Server(_))));
    }
}
