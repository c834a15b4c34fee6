use axum::extract::{Request, State};
use axum::response::{Html, IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");

// ═══════════════════════════════════════════════════════════════
//  GET /
// ═══════════════════════════════════════════════════════════════

/// Landing page for a bare `/`; with a query string the request goes to
/// the static root like any other path.
pub(crate) async fn handle_root(
    State(state): State<AppState>,
    request: Request,
) -> Response {
    if request.uri().query().is_none_or(str::is_empty) {
        return Html(INDEX_HTML).into_response();
    }

    match ServeDir::new(&state.webroot).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
