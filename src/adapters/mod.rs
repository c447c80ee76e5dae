//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - Completion providers (OpenAI, mock)
//! - `sheets` - Lead stores (Google Sheets, in-memory)
//! - `http` - axum router exposing the chat endpoint

pub mod ai;
pub mod http;
pub mod sheets;
