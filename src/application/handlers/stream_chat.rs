//! Chat request pipeline.
//!
//! Assembles the context, relays the answer as [`ChatEvent`]s and runs lead
//! capture once the upstream stream is exhausted. `Done` is always the last
//! event of a stream that was not abandoned by the caller.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::chat::{AssemblyError, ContextAssembler, ConversationRequest};

use super::capture_lead::LeadCapture;
use super::relay::{ChatEvent, RelayOutcome, StreamingRelay};

const EVENT_BUFFER: usize = 32;

/// Stream of events for one chat request.
pub type ChatEventStream = ReceiverStream<ChatEvent>;

/// When lead capture runs relative to `Done`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Capture finishes before `Done` is sent.
    #[default]
    Inline,
    /// `Done` is sent first; capture runs as a tracked task.
    Background,
}

pub struct StreamChatHandler {
    assembler: ContextAssembler,
    relay: StreamingRelay,
    capture: Option<Arc<LeadCapture>>,
    mode: CaptureMode,
    tasks: TaskTracker,
}

impl StreamChatHandler {
    /// Creates a handler with lead capture disabled.
    pub fn new(assembler: ContextAssembler, relay: StreamingRelay) -> Self {
        Self {
            assembler,
            relay,
            capture: None,
            mode: CaptureMode::default(),
            tasks: TaskTracker::new(),
        }
    }

    /// Enables lead capture.
    pub fn with_lead_capture(mut self, capture: LeadCapture, mode: CaptureMode) -> Self {
        self.capture = Some(Arc::new(capture));
        self.mode = mode;
        self
    }

    pub fn lead_capture_enabled(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture_mode(&self) -> CaptureMode {
        self.mode
    }

    /// Starts the pipeline for one request.
    ///
    /// Rejected requests return before any event is produced. Dropping the
    /// returned stream stops the relay.
    pub fn handle(
        &self,
        request: ConversationRequest,
        request_id: Option<String>,
    ) -> Result<ChatEventStream, AssemblyError> {
        let turns = self.assembler.assemble(&request)?;

        let request_id = request_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = tracing::info_span!("chat", request_id = %request_id, turns = request.len());

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let relay = self.relay.clone();
        let capture = self.capture.clone();
        let mode = self.mode;
        let tasks = self.tasks.clone();

        self.tasks.spawn(
            async move {
                match relay.run(turns, &tx).await {
                    RelayOutcome::Completed(answer) => {
                        tracing::info!(
                            fragments = answer.fragment_count(),
                            bytes = answer.len(),
                            "Answer streamed"
                        );
                        drop(answer);

                        if let Some(capture) = capture {
                            match mode {
                                CaptureMode::Inline => {
                                    capture.capture(&request).await;
                                }
                                CaptureMode::Background => {
                                    tasks.spawn(
                                        async move {
                                            capture.capture(&request).await;
                                        }
                                        .in_current_span(),
                                    );
                                }
                            }
                        }

                        let _ = tx.send(ChatEvent::Done).await;
                    }
                    RelayOutcome::Failed { failure, .. } => {
                        tracing::warn!(
                            error = %failure.message,
                            fragments_sent = failure.fragments_sent,
                            "Upstream completion failed"
                        );
                        if tx.send(ChatEvent::Failed(failure)).await.is_ok() {
                            let _ = tx.send(ChatEvent::Done).await;
                        }
                    }
                    RelayOutcome::Disconnected(answer) => {
                        tracing::info!(
                            fragments = answer.fragment_count(),
                            "Caller disconnected, lead capture skipped"
                        );
                    }
                }
            }
            .instrument(span),
        );

        Ok(ReceiverStream::new(rx))
    }

    /// Stops accepting work and waits up to `grace` for running pipelines.
    ///
    /// Returns `false` when tasks were still running at the deadline.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tasks.close();
        tokio::time::timeout(grace, self.tasks.wait()).await.is_ok()
    }
}
