//! `isolated`: print nodes with no inbound or outbound edges.

use philt_graph::GraphDocument;

use crate::cli::IsolatedArgs;
use crate::error::{CliError, Result};

pub async fn execute(args: IsolatedArgs) -> Result<()> {
    let bytes = std::fs::read(&args.graph)
        .map_err(|_| CliError::FileNotFound(args.graph.clone()))?;
    let document: GraphDocument = serde_json::from_slice(&bytes)?;

    for node in document.isolated_nodes() {
        println!("{node}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_and_analyzes_graph_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(
            &path,
            r#"{
                "nodes": ["a", "b", "lonely"],
                "edges": [{"From": "a", "To": "b"}]
            }"#,
        )
        .unwrap();

        execute(IsolatedArgs { graph: path }).await.unwrap();
    }

    #[tokio::test]
    async fn missing_graph_file_errors() {
        let result = execute(IsolatedArgs {
            graph: "/nope/graph.json".into(),
        })
        .await;
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }
}
