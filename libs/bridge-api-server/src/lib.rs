//! HTTP + WebSocket front of the bridge.
//!
//! - `GET /`: landing page
//! - `GET /ws`: one bridge session per upgraded connection
//! - everything else: static files from the web root

mod error;
mod http;
mod ws;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use bridge_api::PartitionSource;
use session_engine::SessionOptions;

pub use error::ApiServerError;
pub use ws::WsConnection;

#[derive(Clone)]
pub(crate) struct AppState {
    source: Arc<dyn PartitionSource>,
    options: SessionOptions,
    webroot: PathBuf,
    sessions: Arc<AtomicU64>,
}

/// Build the router. `webroot` is the static file root.
pub fn router(
    source: Arc<dyn PartitionSource>,
    options: SessionOptions,
    webroot: impl Into<PathBuf>,
) -> Router {
    let state = AppState {
        source,
        options,
        webroot: webroot.into(),
        sessions: Arc::new(AtomicU64::new(0)),
    };

    Router::new()
        .route("/", get(http::handle_root))
        .route("/ws", get(ws::handle_ws))
        .fallback_service(ServeDir::new(&state.webroot))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until `shutdown` is cancelled.
pub async fn run(
    port: u16,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), ApiServerError> {
    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|source| ApiServerError::Bind { port, source })?;
    serve(listener, app, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), ApiServerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "http server listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ApiServerError::Serve)
}
