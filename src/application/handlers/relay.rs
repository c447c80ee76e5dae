//! Streaming relay.
//!
//! Drives one streaming completion, forwards every non-empty fragment to
//! the caller in arrival order, and accumulates the full answer. Terminal
//! events are left to the caller of [`StreamingRelay::run`], which decides
//! what happens between the last fragment and `Done`.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::domain::chat::Turn;
use crate::ports::{AIError, AIProvider, CompletionRequest};

/// Completion parameters for the chat answer.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Model override; provider default when absent.
    pub model: Option<String>,
    /// Maximum answer tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Longest wait for the stream to open or for the next fragment.
    pub idle_timeout: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 600,
            temperature: 0.7,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Caller-visible event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// One fragment of the answer, exactly as received.
    Fragment(String),
    /// The upstream stream failed; no more fragments follow.
    Failed(RelayFailure),
    /// Terminal marker, sent exactly once.
    Done,
}

/// Upstream failure observed by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFailure {
    /// What went wrong.
    pub message: String,
    /// Fragments already delivered before the failure.
    pub fragments_sent: usize,
}

impl RelayFailure {
    /// True when some of the answer had already been delivered.
    pub fn is_partial(&self) -> bool {
        self.fragments_sent > 0
    }
}

/// Concatenation of every relayed fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedAnswer {
    text: String,
    fragments: usize,
}

impl AccumulatedAnswer {
    fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.fragments += 1;
    }

    /// The answer so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of fragments relayed.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True when nothing was relayed.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// How a relay run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream stream was exhausted normally.
    Completed(AccumulatedAnswer),
    /// Upstream failed before or during streaming.
    Failed {
        failure: RelayFailure,
        answer: AccumulatedAnswer,
    },
    /// The caller went away; upstream was dropped.
    Disconnected(AccumulatedAnswer),
}

/// Relays one streaming completion to a caller channel.
#[derive(Clone)]
pub struct StreamingRelay {
    provider: Arc<dyn AIProvider>,
    settings: RelaySettings,
}

impl StreamingRelay {
    /// Creates a relay over the given provider.
    pub fn new(provider: Arc<dyn AIProvider>, settings: RelaySettings) -> Self {
        Self { provider, settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Streams the answer for `turns` into `events`.
    ///
    /// Only `ChatEvent::Fragment` is sent here. The upstream stream is
    /// dropped as soon as the receiving side closes.
    pub async fn run(&self, turns: Vec<Turn>, events: &mpsc::Sender<ChatEvent>) -> RelayOutcome {
        let mut answer = AccumulatedAnswer::default();
        let idle = self.settings.idle_timeout;

        let request = CompletionRequest::new()
            .with_turns(turns)
            .with_model(self.settings.model.clone())
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature);

        let opened = tokio::select! {
            _ = events.closed() => return RelayOutcome::Disconnected(answer),
            opened = timeout(idle, self.provider.stream_complete(request)) => opened,
        };

        let mut stream = match opened {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return failed(e, answer),
            Err(_) => return failed(idle_timeout_error(idle), answer),
        };

        loop {
            let next = tokio::select! {
                _ = events.closed() => return RelayOutcome::Disconnected(answer),
                next = timeout(idle, stream.next()) => next,
            };

            let chunk = match next {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => return failed(e, answer),
                Ok(None) => return RelayOutcome::Completed(answer),
                Err(_) => return failed(idle_timeout_error(idle), answer),
            };

            if let Some(usage) = &chunk.usage {
                tracing::debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "Completion usage reported"
                );
            }

            if !chunk.has_content() {
                continue;
            }

            answer.push(&chunk.delta);
            if events.send(ChatEvent::Fragment(chunk.delta)).await.is_err() {
                return RelayOutcome::Disconnected(answer);
            }
        }
    }
}

fn failed(error: AIError, answer: AccumulatedAnswer) -> RelayOutcome {
    RelayOutcome::Failed {
        failure: RelayFailure {
            message: error.to_string(),
            fragments_sent: answer.fragment_count(),
        },
        answer,
    }
}

fn idle_timeout_error(idle: Duration) -> AIError {
    AIError::Timeout {
        timeout_secs: idle.as_secs().max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use proptest::prelude::*;

    fn relay(provider: MockAIProvider) -> StreamingRelay {
        StreamingRelay::new(
            Arc::new(provider),
            RelaySettings {
                idle_timeout: Duration::from_millis(200),
                ..Default::default()
            },
        )
    }

    async fn run_collect(relay: &StreamingRelay) -> (RelayOutcome, Vec<ChatEvent>) {
        let (tx, mut rx) = mpsc::channel(64);
        let outcome = relay.run(vec![Turn::user("Hi")], &tx).await;
        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (outcome, events)
    }

    mod streaming {
        use super::*;

        #[tokio::test]
        async fn relays_fragments_in_arrival_order() {
            let relay = relay(MockAIProvider::new().with_stream(["General ", "liability ", "covers..."]));

            let (outcome, events) = run_collect(&relay).await;

            assert_eq!(
                events,
                vec![
                    ChatEvent::Fragment("General ".to_string()),
                    ChatEvent::Fragment("liability ".to_string()),
                    ChatEvent::Fragment("covers...".to_string()),
                ]
            );
            match outcome {
                RelayOutcome::Completed(answer) => {
                    assert_eq!(answer.as_str(), "General liability covers...");
                    assert_eq!(answer.fragment_count(), 3);
                }
                other => panic!("Expected Completed, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn empty_fragments_produce_no_events() {
            let relay = relay(MockAIProvider::new().with_stream(["", "Hello", "", " there", ""]));

            let (outcome, events) = run_collect(&relay).await;

            assert_eq!(events.len(), 2);
            assert!(matches!(outcome, RelayOutcome::Completed(a) if a.as_str() == "Hello there"));
        }

        #[tokio::test]
        async fn forwards_request_settings_to_provider() {
            let provider = MockAIProvider::new().with_stream(["ok"]);
            let relay = StreamingRelay::new(
                Arc::new(provider.clone()),
                RelaySettings {
                    model: Some("gpt-4o-mini".to_string()),
                    max_tokens: 600,
                    temperature: 0.7,
                    idle_timeout: Duration::from_secs(1),
                },
            );

            run_collect(&relay).await;

            let calls = provider.get_calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].model.as_deref(), Some("gpt-4o-mini"));
            assert_eq!(calls[0].max_tokens, Some(600));
            assert_eq!(calls[0].temperature, Some(0.7));
            assert_eq!(calls[0].messages, vec![Turn::user("Hi")]);
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn failure_before_first_fragment_is_reported() {
            let relay = relay(MockAIProvider::new().with_error(MockError::AuthenticationFailed));

            let (outcome, events) = run_collect(&relay).await;

            assert!(events.is_empty());
            match outcome {
                RelayOutcome::Failed { failure, .. } => {
                    assert!(!failure.is_partial());
                    assert_eq!(failure.message, "authentication failed");
                }
                other => panic!("Expected Failed, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn mid_stream_failure_keeps_sent_fragments() {
            let relay = relay(MockAIProvider::new().with_stream_failure(
                ["Partial ", "answer"],
                MockError::Network { message: "reset".to_string() },
            ));

            let (outcome, events) = run_collect(&relay).await;

            assert_eq!(events.len(), 2);
            match outcome {
                RelayOutcome::Failed { failure, answer } => {
                    assert!(failure.is_partial());
                    assert_eq!(failure.fragments_sent, 2);
                    assert_eq!(answer.as_str(), "Partial answer");
                }
                other => panic!("Expected Failed, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn stalled_stream_times_out() {
            let relay = relay(MockAIProvider::new().with_stalled_stream(["Thinking"]));

            let (outcome, events) = run_collect(&relay).await;

            assert_eq!(events, vec![ChatEvent::Fragment("Thinking".to_string())]);
            assert!(matches!(outcome, RelayOutcome::Failed { .. }));
        }
    }

    mod cancellation {
        use super::*;

        #[tokio::test]
        async fn closed_receiver_stops_relay() {
            let provider = MockAIProvider::new().with_stalled_stream(["never seen"]);
            let relay = StreamingRelay::new(
                Arc::new(provider),
                RelaySettings {
                    idle_timeout: Duration::from_secs(60),
                    ..Default::default()
                },
            );
            let (tx, rx) = mpsc::channel(1);
            drop(rx);

            let outcome = timeout(Duration::from_secs(2), relay.run(vec![Turn::user("Hi")], &tx))
                .await
                .expect("relay should stop promptly");

            assert!(matches!(outcome, RelayOutcome::Disconnected(_)));
        }

        #[tokio::test]
        async fn receiver_dropped_mid_stream_stops_relay() {
            let provider = MockAIProvider::new().with_stalled_stream(["first", "second"]);
            let relay = StreamingRelay::new(
                Arc::new(provider),
                RelaySettings {
                    idle_timeout: Duration::from_secs(60),
                    ..Default::default()
                },
            );
            let (tx, mut rx) = mpsc::channel(1);

            let reader = tokio::spawn(async move {
                let first = rx.recv().await;
                drop(rx);
                first
            });

            let outcome = timeout(Duration::from_secs(2), relay.run(vec![Turn::user("Hi")], &tx))
                .await
                .expect("relay should stop promptly");

            assert_eq!(
                reader.await.unwrap(),
                Some(ChatEvent::Fragment("first".to_string()))
            );
            assert!(matches!(outcome, RelayOutcome::Disconnected(_)));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn emitted_fragments_concatenate_to_answer(
            fragments in proptest::collection::vec(".{0,6}", 0..12)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let relay = relay(MockAIProvider::new().with_stream(fragments.clone()));

            let (outcome, events) = runtime.block_on(run_collect(&relay));

            let emitted: String = events
                .iter()
                .map(|e| match e {
                    ChatEvent::Fragment(text) => text.as_str(),
                    other => panic!("unexpected event {:?}", other),
                })
                .collect();
            let expected: String = fragments.concat();
            let non_empty = fragments.iter().filter(|f| !f.is_empty()).count();

            prop_assert_eq!(events.len(), non_empty);
            prop_assert_eq!(&emitted, &expected);
            match outcome {
                RelayOutcome::Completed(answer) => prop_assert_eq!(answer.as_str(), expected.as_str()),
                other => prop_assert!(false, "unexpected outcome {:?}", other),
            }
        }
    }
}
