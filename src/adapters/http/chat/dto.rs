//! Request and response DTOs for the chat endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::chat::{ConversationRequest, Role, Turn};

/// Terminal event payload.
pub const DONE_MARKER: &str = "[DONE]";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequestDto {
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDto {
    pub role: Role,
    pub content: String,
}

impl From<ChatRequestDto> for ConversationRequest {
    fn from(dto: ChatRequestDto) -> Self {
        ConversationRequest::new(
            dto.messages
                .into_iter()
                .map(|m| Turn::new(m.role, m.content))
                .collect(),
        )
    }
}

/// JSON payload of a non-terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamPayload {
    Content { content: String },
    Error { error: String },
}

/// Error body for non-streaming failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
