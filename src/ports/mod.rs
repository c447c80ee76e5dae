//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - streaming and non-streaming chat completion
//! - `LeadStore` - append-only lead table

mod ai_provider;
mod lead_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};
pub use lead_store::{LeadStore, LeadStoreError};
