//! Completion provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// OpenAI configuration shared by the chat relay and the lead extractor
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key (falls back to `OPENAI_API_KEY`)
    pub openai_api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model for chat answers
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model for lead extraction; chat model when unset
    pub extraction_model: Option<String>,

    /// Answer token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Longest wait for each streamed fragment
    #[serde(default = "default_stream_idle_timeout")]
    pub stream_idle_timeout_secs: u64,

    /// Whole-call bound for non-streaming completions
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retries for non-streaming completions
    #[serde(default)]
    pub max_retries: u32,
}

impl AiConfig {
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn extraction_model(&self) -> &str {
        self.extraction_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.chat_model)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_openai() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::MustBePositive("ai.max_tokens"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("ai.connect_timeout_secs"));
        }
        if self.stream_idle_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("ai.stream_idle_timeout_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("ai.request_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            extraction_model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            connect_timeout_secs: default_connect_timeout(),
            stream_idle_timeout_secs: default_stream_idle_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_retries: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    600
}

fn default_temperature() -> f32 {
    0.7
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_stream_idle_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30
}
