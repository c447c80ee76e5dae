//! HTTP handlers for the chat endpoint.

use std::convert::Infallible;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};

use crate::application::handlers::ChatEvent;
use crate::domain::chat::AssemblyError;

use super::super::AppState;
use super::dto::{ChatRequestDto, ErrorResponse, StreamPayload, DONE_MARKER};

/// POST /chat - stream the assistant's answer as server-sent events.
///
/// # Errors
/// - 422 Unprocessable Entity: a message uses the `system` role
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequestDto>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ChatApiError> {
    let request_id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(String::from);

    let events = state.chat.handle(body.into(), request_id)?;

    Ok(Sse::new(events.map(|event| Ok(to_sse_event(event)))).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: ChatEvent) -> Event {
    let payload = match event {
        ChatEvent::Fragment(content) => StreamPayload::Content { content },
        ChatEvent::Failed(failure) => StreamPayload::Error {
            error: failure.message,
        },
        ChatEvent::Done => return Event::default().data(DONE_MARKER),
    };

    match serde_json::to_string(&payload) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode stream payload");
            Event::default().data(r#"{"error":"encoding failed"}"#)
        }
    }
}

/// API error type for HTTP responses.
#[derive(Debug)]
pub enum ChatApiError {
    InvalidConversation(String),
    NotFound(String),
}

impl From<AssemblyError> for ChatApiError {
    fn from(err: AssemblyError) -> Self {
        ChatApiError::InvalidConversation(err.to_string())
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ChatApiError::InvalidConversation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("INVALID_CONVERSATION", msg),
            ),
            ChatApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", msg))
            }
        };

        (status, Json(error)).into_response()
    }
}
