//! Landing page and health check.

use axum::extract::{Json, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use super::chat::ChatApiError;
use super::AppState;

/// GET / - the static chat page.
pub async fn landing(State(state): State<AppState>) -> Result<Html<String>, ChatApiError> {
    let path = state.static_dir.join("index.html");
    tokio::fs::read_to_string(&path).await.map(Html).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Landing page unavailable");
        ChatApiError::NotFound("index.html".to_string())
    })
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/health", get(health))
}
