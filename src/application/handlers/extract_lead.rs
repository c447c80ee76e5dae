//! Lead extraction.
//!
//! One non-streaming completion over the trailing user utterances. Every
//! failure is folded into [`ExtractionOutcome::Failed`].

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::domain::chat::{ConversationRequest, Role};
use crate::domain::lead::{parse_extracted_lead, ExtractionFailure, ExtractionOutcome};
use crate::ports::{AIProvider, CompletionRequest};

const INSTRUCTION: &str = "Extract contact info from this conversation. Return ONLY JSON, no markdown:\n\
{\"name\":null,\"email\":null,\"phone\":null,\"business_type\":null,\"num_employees\":null,\"has_contact_info\":false}\n\
Set has_contact_info true only if email OR phone is present.\n\
Conversation:\n";

/// Extraction call parameters.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub model: Option<String>,
    pub max_tokens: u32,
    /// Number of trailing user turns considered.
    pub user_turn_window: usize,
    pub timeout: Duration,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 150,
            user_turn_window: 4,
            timeout: Duration::from_secs(20),
        }
    }
}

/// Asks the completion service for a structured contact guess.
#[derive(Clone)]
pub struct LeadExtractor {
    provider: Arc<dyn AIProvider>,
    settings: ExtractionSettings,
}

impl LeadExtractor {
    pub fn new(provider: Arc<dyn AIProvider>, settings: ExtractionSettings) -> Self {
        Self { provider, settings }
    }

    /// The trailing user turns, each prefixed with `User: `, oldest first.
    pub fn conversation_snippet(&self, request: &ConversationRequest) -> String {
        request
            .recent_user_utterances(self.settings.user_turn_window)
            .into_iter()
            .map(|text| format!("User: {}", text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Runs one extraction attempt.
    pub async fn extract(&self, request: &ConversationRequest) -> ExtractionOutcome {
        let snippet = self.conversation_snippet(request);
        if snippet.is_empty() {
            return ExtractionOutcome::NoContact;
        }

        let completion = CompletionRequest::new()
            .with_message(Role::User, format!("{}{}", INSTRUCTION, snippet))
            .with_model(self.settings.model.clone())
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(0.0);

        let response = match timeout(self.settings.timeout, self.provider.complete(completion)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return ExtractionOutcome::Failed(ExtractionFailure::Completion(e.to_string()))
            }
            Err(_) => {
                return ExtractionOutcome::Failed(ExtractionFailure::Timeout(
                    self.settings.timeout.as_secs(),
                ))
            }
        };

        match parse_extracted_lead(&response.content) {
            Ok(lead) => {
                if lead.claim_disagrees() {
                    tracing::debug!(
                        claimed = ?lead.claimed_contact_info,
                        recomputed = lead.has_contact_info(),
                        "Model contact flag overridden"
                    );
                }
                ExtractionOutcome::from_lead(lead)
            }
            Err(e) => ExtractionOutcome::Failed(e.into()),
        }
    }
}
