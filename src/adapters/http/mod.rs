//! HTTP adapter - axum router for the chat service.

pub mod chat;
pub mod pages;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use http::HeaderValue;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::handlers::StreamChatHandler;

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<StreamChatHandler>,
    /// Directory holding `index.html`.
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(chat: Arc<StreamChatHandler>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            chat,
            static_dir: static_dir.into(),
        }
    }
}

/// Cross-cutting HTTP settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Allowed origins; any origin when empty.
    pub cors_origins: Vec<String>,
    /// Bound on producing response headers.
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the full application router.
pub fn app_router(state: AppState, settings: &HttpSettings) -> Router {
    Router::new()
        .merge(pages::page_routes())
        .merge(chat::chat_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(&settings.cors_origins))
                .layer(TimeoutLayer::new(settings.request_timeout)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(parsed)
}
