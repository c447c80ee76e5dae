//! AI Provider Adapters.
//!
//! ## Available Adapters
//!
//! - `OpenAIProvider` - OpenAI chat completions, streaming over SSE
//! - `MockAIProvider` - Scripted provider for tests and local runs

mod mock_provider;
mod openai_provider;

pub use mock_provider::{MockAIProvider, MockError, MockResponse, StreamEnding};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
