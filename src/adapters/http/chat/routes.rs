//! Axum routes for the chat endpoint.

use axum::routing::post;
use axum::Router;

use super::super::AppState;
use super::handlers::chat;

/// - POST /chat - streaming chat completion
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}
