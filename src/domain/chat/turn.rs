//! Conversation turns and the per-call conversation request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Directive injected by the assembler only.
    System,
    /// The person chatting.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Creates a new turn.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered turns supplied by one inbound call.
///
/// Order is preserved verbatim; it determines the model's context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationRequest {
    turns: Vec<Turn>,
}

impl ConversationRequest {
    /// Wraps the caller's turns.
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// All turns in caller order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when the caller sent no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last `window` user utterances, oldest first.
    pub fn recent_user_utterances(&self, window: usize) -> Vec<&str> {
        let user_turns: Vec<&str> = self
            .turns
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .collect();
        let skip = user_turns.len().saturating_sub(window);
        user_turns.into_iter().skip(skip).collect()
    }
}

impl From<Vec<Turn>> for ConversationRequest {
    fn from(turns: Vec<Turn>) -> Self {
        Self::new(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn unknown_role_fails_to_deserialize() {
        let result = serde_json::from_str::<Turn>(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn recent_user_utterances_keeps_trailing_window_in_order() {
        let request = ConversationRequest::new(vec![
            Turn::user("one"),
            Turn::assistant("reply"),
            Turn::user("two"),
            Turn::user("three"),
            Turn::assistant("reply"),
            Turn::user("four"),
            Turn::user("five"),
        ]);

        assert_eq!(
            request.recent_user_utterances(4),
            vec!["two", "three", "four", "five"]
        );
    }

    #[test]
    fn recent_user_utterances_with_short_history_returns_all() {
        let request = ConversationRequest::new(vec![Turn::user("only"), Turn::assistant("hi")]);
        assert_eq!(request.recent_user_utterances(4), vec!["only"]);
    }

    #[test]
    fn recent_user_utterances_ignores_assistant_text() {
        let request = ConversationRequest::new(vec![Turn::assistant("email me at x@y.com")]);
        assert!(request.recent_user_utterances(4).is_empty());
    }
}
