//! OpenAI Provider - Implementation of AIProvider for the chat completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! Responses arrive as Server-Sent Events. Network reads do not respect
//! line boundaries, so bytes are buffered until a full `data:` line is
//! available. Each line becomes zero or more `StreamChunk`s; `[DONE]` ends
//! decoding.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::chat::Turn;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    /// Model used when a request carries none.
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout for non-streaming calls.
    pub request_timeout: Duration,
    /// Retries on transient failures, non-streaming calls only.
    pub max_retries: u32,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_retries: 0,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a provider with its own HTTP client.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AIError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_openai_request(&self, request: &CompletionRequest, stream: bool) -> OpenAIRequest {
        OpenAIRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: Some(stream),
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<Response, AIError> {
        let mut builder = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .json(&self.to_openai_request(request, stream));

        // Streaming bodies are bounded per fragment by the caller.
        if !stream {
            builder = builder.timeout(self.config.request_timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AIError::Timeout {
                    timeout_secs: self.config.request_timeout.as_secs(),
                }
            } else if e.is_connect() {
                AIError::network(format!("Connection failed: {}", e))
            } else {
                AIError::network(e.to_string())
            }
        })?;

        Self::handle_response_status(response).await
    }

    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        let message = api_error_message(&error_body).unwrap_or(error_body);

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&message))),
            400..=499 => Err(AIError::InvalidRequest(message)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, message
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, message
            ))),
        }
    }

    /// Reads "try again in Ns" from a rate-limit message, defaulting to 30.
    fn parse_retry_after(message: &str) -> u32 {
        message
            .find("try again in ")
            .map(|idx| &message[idx + 13..])
            .and_then(|rest| {
                let end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                rest[..end].parse().ok()
            })
            .unwrap_or(30)
    }

    async fn parse_response(response: Response) -> Result<CompletionResponse, AIError> {
        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: openai_response
                .usage
                .map(TokenUsage::from)
                .unwrap_or_default(),
            model: openai_response.model,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .map(FinishReason::from_provider)
                .unwrap_or(FinishReason::Stop),
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut attempt = 0;

        loop {
            let result = match self.send(&request, false).await {
                Ok(response) => Self::parse_response(response).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    tracing::debug!(attempt, error = %err, "Retrying completion");
                    // Exponential backoff: 1s, 2s, 4s, ...
                    sleep(Duration::from_secs(1 << attempt.min(5))).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<CompletionStream, AIError> {
        let response = self.send(&request, true).await?;

        let stream = response
            .bytes_stream()
            .map(Some)
            .chain(stream::once(async { None }))
            .scan(SseDecoder::default(), |decoder, item| {
                let chunks = match item {
                    Some(Ok(bytes)) => decoder.feed(&bytes),
                    Some(Err(e)) => vec![Err(AIError::network(format!("Stream error: {}", e)))],
                    None => decoder.finish(),
                };
                futures::future::ready(Some(chunks))
            })
            .flat_map(stream::iter);

        Ok(stream.boxed())
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model)
    }
}

/// Incremental decoder for the completion event stream.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Consumes raw bytes, returning chunks for every complete line.
    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, AIError>> {
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.decode_line(&String::from_utf8_lossy(&line), &mut out);
        }
        out
    }

    /// Flushes a trailing line with no newline.
    fn finish(&mut self) -> Vec<Result<StreamChunk, AIError>> {
        let rest = std::mem::take(&mut self.buffer);
        let mut out = Vec::new();
        self.decode_line(&String::from_utf8_lossy(&rest), &mut out);
        out
    }

    fn decode_line(&mut self, line: &str, out: &mut Vec<Result<StreamChunk, AIError>>) {
        if self.done {
            return;
        }

        let Some(data) = line.trim_end().strip_prefix("data:") else {
            return;
        };
        let data = data.trim_start();

        if data.is_empty() {
            return;
        }
        if data == "[DONE]" {
            self.done = true;
            return;
        }

        let chunk = match serde_json::from_str::<StreamResponseChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                out.push(Err(AIError::parse(format!("Failed to parse SSE chunk: {}", e))));
                return;
            }
        };

        if let Some(error) = chunk.error {
            self.done = true;
            out.push(Err(AIError::unavailable(error.message)));
            return;
        }

        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                out.push(Ok(StreamChunk::content(content)));
            }
            if let Some(reason) = choice.finish_reason {
                out.push(Ok(StreamChunk::finished(FinishReason::from_provider(&reason))));
            }
        }

        if let Some(usage) = chunk.usage {
            out.push(Ok(StreamChunk::usage(usage.into())));
        }
    }
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl From<&Turn> for OpenAIMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role.as_str(),
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<OpenAIUsage> for TokenUsage {
    fn from(usage: OpenAIUsage) -> Self {
        TokenUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<OpenAIUsage>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::Role;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAIProvider {
        OpenAIProvider::new(OpenAIConfig::new("test-key").with_base_url(server.uri())).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new()
            .with_message(Role::System, "Be brief.")
            .with_message(Role::User, "Hello")
            .with_max_tokens(600)
            .with_temperature(0.7)
    }

    fn sse(lines: &[&str]) -> String {
        lines.iter().map(|l| format!("data: {}\n\n", l)).collect()
    }

    mod decoder {
        use super::*;

        fn deltas(chunks: &[Result<StreamChunk, AIError>]) -> Vec<String> {
            chunks
                .iter()
                .filter_map(|c| c.as_ref().ok())
                .filter(|c| c.has_content())
                .map(|c| c.delta.clone())
                .collect()
        }

        #[test]
        fn content_chunk_yields_delta() {
            let mut decoder = SseDecoder::default();
            let chunks = decoder.feed(
                br#"data: {"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}
"#,
            );

            assert_eq!(deltas(&chunks), vec!["Hello"]);
        }

        #[test]
        fn line_split_across_reads_is_reassembled() {
            let mut decoder = SseDecoder::default();
            let mut chunks = decoder.feed(br#"data: {"choices":[{"delta":{"con"#);
            assert!(chunks.is_empty());

            chunks.extend(decoder.feed(b"tent\":\"Hi\"}}]}\n\n"));

            assert_eq!(deltas(&chunks), vec!["Hi"]);
        }

        #[test]
        fn usage_only_chunk_is_reported() {
            let mut decoder = SseDecoder::default();
            let chunks = decoder
                .feed(b"data: {\"choices\":[],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":3}}\n");

            let usage = chunks[0].as_ref().unwrap().usage.clone().unwrap();
            assert_eq!(usage.total_tokens, 15);
        }

        #[test]
        fn done_marker_stops_decoding() {
            let mut decoder = SseDecoder::default();
            let chunks = decoder.feed(
                b"data: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
            );

            assert!(chunks.is_empty());
        }

        #[test]
        fn error_event_becomes_error() {
            let mut decoder = SseDecoder::default();
            let chunks = decoder.feed(b"data: {\"error\":{\"message\":\"overloaded\"}}\n");

            assert!(matches!(&chunks[0], Err(AIError::Unavailable { message }) if message == "overloaded"));
        }

        #[test]
        fn trailing_line_without_newline_is_flushed() {
            let mut decoder = SseDecoder::default();
            assert!(decoder
                .feed(br#"data: {"choices":[{"delta":{"content":"end"}}]}"#)
                .is_empty());

            assert_eq!(deltas(&decoder.finish()), vec!["end"]);
        }

        #[test]
        fn comments_and_blank_lines_are_ignored() {
            let mut decoder = SseDecoder::default();
            assert!(decoder.feed(b": keep-alive\n\n\r\n").is_empty());
        }
    }

    mod http {
        use super::*;

        #[tokio::test]
        async fn streams_fragments_in_order() {
            let server = MockServer::start().await;
            let body = sse(&[
                r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#,
                r#"{"choices":[{"delta":{"content":"General "}}]}"#,
                r#"{"choices":[{"delta":{"content":"liability"}}]}"#,
                r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
                "[DONE]",
            ]);
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .and(header("authorization", "Bearer test-key"))
                .and(body_partial_json(serde_json::json!({
                    "model": "gpt-4o-mini",
                    "stream": true,
                    "max_tokens": 600,
                    "messages": [
                        {"role": "system", "content": "Be brief."},
                        {"role": "user", "content": "Hello"}
                    ]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
                .mount(&server)
                .await;

            let stream = provider(&server).stream_complete(request()).await.unwrap();
            let chunks: Vec<_> = stream.collect().await;

            let text: String = chunks
                .iter()
                .map(|c| c.as_ref().unwrap().delta.as_str())
                .collect();
            assert_eq!(text, "General liability");
            assert!(chunks
                .iter()
                .any(|c| c.as_ref().unwrap().finish_reason == Some(FinishReason::Stop)));
        }

        #[tokio::test]
        async fn request_model_overrides_default() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "model": "gpt-4o",
                    "choices": [{"message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"}],
                    "usage": {"prompt_tokens": 5, "completion_tokens": 1}
                })))
                .mount(&server)
                .await;

            let response = provider(&server)
                .complete(request().with_model(Some("gpt-4o".to_string())))
                .await
                .unwrap();

            assert_eq!(response.content, "{}");
            assert_eq!(response.model, "gpt-4o");
            assert_eq!(response.usage.total_tokens, 6);
        }

        #[tokio::test]
        async fn unauthorized_maps_to_authentication_failed() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                    "error": {"message": "Incorrect API key provided"}
                })))
                .mount(&server)
                .await;

            let result = provider(&server).stream_complete(request()).await;

            assert!(matches!(result, Err(AIError::AuthenticationFailed)));
        }

        #[tokio::test]
        async fn server_error_maps_to_unavailable() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
                .mount(&server)
                .await;

            let result = provider(&server).complete(request()).await;

            assert!(matches!(result, Err(AIError::Unavailable { .. })));
        }
    }

    #[test]
    fn parse_retry_after_from_message() {
        let retry = OpenAIProvider::parse_retry_after(
            "Rate limit exceeded. Please try again in 20s.",
        );
        assert_eq!(retry, 20);
    }

    #[test]
    fn parse_retry_after_default() {
        assert_eq!(OpenAIProvider::parse_retry_after("Something went wrong"), 30);
    }

    #[test]
    fn config_builder_trims_base_url() {
        let config = OpenAIConfig::new("k")
            .with_base_url("http://localhost:9000/v1/")
            .with_max_retries(2);

        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.api_key(), "k");
    }
}
