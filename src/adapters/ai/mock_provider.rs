//! Mock AI Provider for testing.
//!
//! Scripted implementation of the [`AIProvider`] port so the relay, the
//! extractor and the HTTP surface can be exercised without a real model.
//!
//! # Features
//!
//! - Queued responses, consumed in call order
//! - Exact fragment scripts for streaming, including mid-stream failure
//!   and streams that stall forever
//! - Simulated latency
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_stream(["Hello", ", world"])
//!     .with_response(r#"{"email":"a@b.com"}"#);
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Scripted responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    /// Simulated latency before each call resolves.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A scripted response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Plain text. Streamed as whitespace-preserving word fragments.
    Success { content: String },
    /// Exact fragments, followed by the given ending.
    Stream {
        fragments: Vec<String>,
        ending: StreamEnding,
    },
    /// The call itself fails.
    Error(MockError),
}

/// How a scripted stream ends.
#[derive(Debug, Clone)]
pub enum StreamEnding {
    /// Stop chunk with usage.
    Finished,
    /// An error item.
    Fails(MockError),
    /// Never yields again.
    Stalls,
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u64 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(self, response: MockResponse) -> Self {
        guard(&self.responses).push_back(response);
        self
    }

    /// Queues a successful text response.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: content.into(),
        })
    }

    /// Queues a stream of exact fragments that ends normally.
    pub fn with_stream<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(MockResponse::Stream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ending: StreamEnding::Finished,
        })
    }

    /// Queues a stream that fails after the given fragments.
    pub fn with_stream_failure<I, S>(self, fragments: I, error: MockError) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(MockResponse::Stream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ending: StreamEnding::Fails(error),
        })
    }

    /// Queues a stream that hangs after the given fragments.
    pub fn with_stalled_stream<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(MockResponse::Stream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ending: StreamEnding::Stalls,
        })
    }

    /// Queues a call-level failure.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        guard(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        guard(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        guard(&self.calls).clear();
    }

    async fn begin(&self, request: CompletionRequest) -> MockResponse {
        guard(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        guard(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
            })
    }
}

fn usage() -> TokenUsage {
    TokenUsage::new(10, 20)
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let content = match self.begin(request).await {
            MockResponse::Success { content } => content,
            MockResponse::Stream { fragments, ending } => match ending {
                StreamEnding::Fails(err) => return Err(err.into()),
                _ => fragments.concat(),
            },
            MockResponse::Error(err) => return Err(err.into()),
        };

        Ok(CompletionResponse {
            content,
            usage: usage(),
            model: self.info.model.clone(),
            finish_reason: FinishReason::Stop,
        })
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<CompletionStream, AIError> {
        let (fragments, ending) = match self.begin(request).await {
            MockResponse::Success { content } => (
                content.split_inclusive(' ').map(String::from).collect(),
                StreamEnding::Finished,
            ),
            MockResponse::Stream { fragments, ending } => (fragments, ending),
            MockResponse::Error(err) => return Err(err.into()),
        };

        let chunks = stream::iter(
            fragments
                .into_iter()
                .map(|fragment| Ok(StreamChunk::content(fragment))),
        );

        Ok(match ending {
            StreamEnding::Finished => chunks
                .chain(stream::iter([
                    Ok(StreamChunk::finished(FinishReason::Stop)),
                    Ok(StreamChunk::usage(usage())),
                ]))
                .boxed(),
            StreamEnding::Fails(err) => chunks.chain(stream::once(async move { Err(err.into()) })).boxed(),
            StreamEnding::Stalls => chunks.chain(stream::pending()).boxed(),
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
