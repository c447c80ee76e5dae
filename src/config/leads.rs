//! Lead capture configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::handlers::CaptureMode;

use super::error::ValidationError;

/// Lead extraction and storage configuration.
///
/// Lead capture is disabled when no credentials are configured.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadsConfig {
    /// Service-account key JSON (falls back to `GOOGLE_CREDENTIALS_JSON`)
    pub google_credentials_json: Option<String>,

    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,

    /// Skips the lookup by name when set
    pub spreadsheet_id: Option<String>,

    /// Worksheet title; first sheet when unset
    pub worksheet: Option<String>,

    #[serde(default = "default_notes")]
    pub default_notes: String,

    /// Trailing user turns given to the extractor
    #[serde(default = "default_user_turn_window")]
    pub user_turn_window: usize,

    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,

    #[serde(default = "default_extraction_timeout")]
    pub extraction_timeout_secs: u64,

    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,

    #[serde(default)]
    pub capture_mode: CaptureMode,
}

impl LeadsConfig {
    pub fn is_enabled(&self) -> bool {
        self.google_credentials_json
            .as_ref()
            .is_some_and(|c| !c.trim().is_empty())
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.spreadsheet_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("leads.spreadsheet_name"));
        }
        if self.user_turn_window == 0 {
            return Err(ValidationError::MustBePositive("leads.user_turn_window"));
        }
        if self.extraction_max_tokens == 0 {
            return Err(ValidationError::MustBePositive("leads.extraction_max_tokens"));
        }
        if self.extraction_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("leads.extraction_timeout_secs"));
        }
        if self.store_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("leads.store_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            google_credentials_json: None,
            spreadsheet_name: default_spreadsheet_name(),
            spreadsheet_id: None,
            worksheet: None,
            default_notes: default_notes(),
            user_turn_window: default_user_turn_window(),
            extraction_max_tokens: default_extraction_max_tokens(),
            extraction_timeout_secs: default_extraction_timeout(),
            store_timeout_secs: default_store_timeout(),
            capture_mode: CaptureMode::default(),
        }
    }
}

fn default_spreadsheet_name() -> String {
    "Insurance Leads".to_string()
}

fn default_notes() -> String {
    "Chatbot lead".to_string()
}

fn default_user_turn_window() -> usize {
    4
}

fn default_extraction_max_tokens() -> u32 {
    150
}

fn default_extraction_timeout() -> u64 {
    20
}

fn default_store_timeout() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LeadsConfig::default();
        assert_eq!(config.spreadsheet_name, "Insurance Leads");
        assert_eq!(config.default_notes, "Chatbot lead");
        assert_eq!(config.user_turn_window, 4);
        assert_eq!(config.extraction_max_tokens, 150);
        assert_eq!(config.capture_mode, CaptureMode::Inline);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_credentials_disable_capture() {
        let config = LeadsConfig {
            google_credentials_json: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_zero_window_is_invalid() {
        let config = LeadsConfig {
            user_turn_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
