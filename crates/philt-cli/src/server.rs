//! UI push server.
//!
//! Serves the embedded visualization assets, streams the graph and events
//! documents from disk on every request, and pushes an `"update"`
//! notification to WebSocket and SSE subscribers whenever either document
//! changes on disk. The push path is stateless: the server never streams
//! graph deltas, clients refetch both documents on notification.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response, Sse},
    routing::get,
    Router,
};
use notify::{RecursiveMode, Watcher};
use rust_embed::RustEmbed;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{CliError, Result};
use crate::ui;

/// Embedded static front-end.
#[derive(RustEmbed)]
#[folder = "assets/ui/"]
struct UiAssets;

/// Shared server state: document locations plus the update fan-out channel.
pub struct UiState {
    pub graph_path: PathBuf,
    pub events_path: PathBuf,
    pub notifier: tokio::sync::broadcast::Sender<()>,
}

pub type SharedState = Arc<UiState>;

impl UiState {
    pub fn new(graph_path: PathBuf, events_path: PathBuf) -> SharedState {
        let (notifier, _) = tokio::sync::broadcast::channel(16);
        Arc::new(Self {
            graph_path,
            events_path,
            notifier,
        })
    }
}

/// Watch the directories containing the two documents and notify
/// subscribers when either target file changes.
///
/// Returns the watcher; it stops when dropped.
pub fn start_document_watcher(state: SharedState) -> Result<notify::RecommendedWatcher> {
    let graph_dir = parent_dir(&state.graph_path);
    let events_dir = parent_dir(&state.events_path);

    let watch_state = Arc::clone(&state);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        let hit = event
            .paths
            .iter()
            .any(|p| *p == watch_state.graph_path || *p == watch_state.events_path);
        if hit {
            // No receivers is fine; nobody is connected yet.
            let _ = watch_state.notifier.send(());
        }
    })?;

    watcher.watch(&graph_dir, RecursiveMode::NonRecursive)?;
    if events_dir != graph_dir {
        watcher.watch(&events_dir, RecursiveMode::NonRecursive)?;
    }
    Ok(watcher)
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

/// Bind and serve until the process terminates.
pub async fn serve(addr: &str, state: SharedState) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::Server(format!("failed to bind to {addr}: {e}")))?;
    ui::success(&format!("UI listening on http://{addr}"));
    axum::serve(listener, app)
        .await
        .map_err(|e| CliError::Server(format!("server error: {e}")))
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/graph.json", get(serve_graph))
        .route("/events.json", get(serve_events))
        .route("/ws", get(handle_ws))
        .route("/sse", get(handle_sse))
        .route("/favicon.ico", get(handle_favicon))
        .fallback(serve_asset)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Stream a JSON document from disk; no caching so rescans show up on the
/// next fetch.
async fn serve_document(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from(bytes))
            .unwrap(),
        Err(err) => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(format!("{}: {err}", path.display())))
            .unwrap(),
    }
}

async fn serve_graph(State(state): State<SharedState>) -> Response {
    serve_document(&state.graph_path).await
}

async fn serve_events(State(state): State<SharedState>) -> Response {
    serve_document(&state.events_path).await
}

async fn handle_favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// WebSocket subscribers get a text frame `"update"` per notification.
async fn handle_ws(State(state): State<SharedState>, upgrade: WebSocketUpgrade) -> Response {
    let rx = state.notifier.subscribe();
    upgrade.on_upgrade(move |socket| ws_loop(socket, rx))
}

async fn ws_loop(mut socket: WebSocket, mut rx: tokio::sync::broadcast::Receiver<()>) {
    loop {
        tokio::select! {
            notification = rx.recv() => {
                match notification {
                    Ok(()) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        if socket.send(Message::Text("update".into())).await.is_err() {
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                }
            }
            // Consume and ignore client messages; close on disconnect.
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(_)) => {}
                    _ => return,
                }
            }
        }
    }
}

/// SSE fallback for clients that cannot hold a WebSocket open.
async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl tokio_stream::Stream<Item = std::result::Result<axum::response::sse::Event, std::convert::Infallible>>>
{
    use axum::response::sse::Event;
    let stream = BroadcastStream::new(state.notifier.subscribe())
        .map(|_| Ok(Event::default().event("update").data("1")));
    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Serve any path from the embedded asset tree; `/` maps to `index.html`.
async fn serve_asset(uri: Uri) -> Response {
    let path = uri.path();
    let name = if path == "/" {
        "index.html"
    } else {
        path.trim_start_matches('/')
    };
    match UiAssets::get(name) {
        Some(asset) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(name))
            .header(header::CACHE_CONTROL, "no-store")
            .body(Body::from(asset.data.into_owned()))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(format!("not found: {path}")))
            .unwrap(),
    }
}

/// Content type from file extension.
fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    match extension {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "css" => "text/css",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
