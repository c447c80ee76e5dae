//! HTTP adapter for the streaming chat endpoint.

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequestDto, ErrorResponse, MessageDto, StreamPayload, DONE_MARKER};
pub use handlers::{chat, ChatApiError};
pub use routes::chat_routes;
