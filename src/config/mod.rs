//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `AGENCY_CONCIERGE`
//! prefix and `__` between nested keys. The unprefixed `OPENAI_API_KEY`
//! and `GOOGLE_CREDENTIALS_JSON` are honoured as fallbacks.
//!
//! # Example
//!
//! ```no_run
//! use agency_concierge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod leads;
mod prompt;
mod server;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use leads::LeadsConfig;
pub use prompt::PromptConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "AGENCY_CONCIERGE";

/// Unprefixed variables and the keys they back.
const FALLBACKS: [(&str, &str); 2] = [
    ("OPENAI_API_KEY", "ai.openai_api_key"),
    ("GOOGLE_CREDENTIALS_JSON", "leads.google_credentials_json"),
];

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server (bind address, environment, CORS, static files)
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion provider (OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Lead extraction and the spreadsheet store
    #[serde(default)]
    pub leads: LeadsConfig,

    /// System prompt profile
    #[serde(default)]
    pub prompt: PromptConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads variables with the `AGENCY_CONCIERGE` prefix
    /// 3. Applies unprefixed fallbacks for keys still unset
    ///
    /// # Environment Variable Format
    ///
    /// - `AGENCY_CONCIERGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `AGENCY_CONCIERGE__LEADS__CAPTURE_MODE=background`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        for (var, key) in FALLBACKS {
            if let Some(value) = vars.get(var).filter(|v| !v.trim().is_empty()) {
                builder = builder.set_default(key, value.as_str())?;
            }
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .source(Some(vars)),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid,
    /// including an unknown prompt profile.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.leads.validate()?;
        self.prompt.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::CaptureMode;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let config = AppConfig::from_vars(HashMap::new()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ai.chat_model, "gpt-4o-mini");
        assert_eq!(config.leads.spreadsheet_name, "Insurance Leads");
        assert!(!config.leads.is_enabled());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prefixed_values() {
        let config = AppConfig::from_vars(vars(&[
            ("AGENCY_CONCIERGE__SERVER__PORT", "3000"),
            ("AGENCY_CONCIERGE__SERVER__ENVIRONMENT", "production"),
            ("AGENCY_CONCIERGE__AI__OPENAI_API_KEY", "sk-prefixed"),
            ("AGENCY_CONCIERGE__LEADS__CAPTURE_MODE", "background"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.ai.openai_api_key.as_deref(), Some("sk-prefixed"));
        assert_eq!(config.leads.capture_mode, CaptureMode::Background);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unprefixed_fallbacks() {
        let config = AppConfig::from_vars(vars(&[
            ("OPENAI_API_KEY", "sk-plain"),
            ("GOOGLE_CREDENTIALS_JSON", "{\"client_email\":\"x\"}"),
        ]))
        .unwrap();

        assert_eq!(config.ai.openai_api_key.as_deref(), Some("sk-plain"));
        assert!(config.leads.is_enabled());
    }

    #[test]
    fn test_prefixed_value_wins_over_fallback() {
        let config = AppConfig::from_vars(vars(&[
            ("OPENAI_API_KEY", "sk-plain"),
            ("AGENCY_CONCIERGE__AI__OPENAI_API_KEY", "sk-prefixed"),
        ]))
        .unwrap();

        assert_eq!(config.ai.openai_api_key.as_deref(), Some("sk-prefixed"));
    }

    #[test]
    fn test_unrelated_variables_are_ignored() {
        let config = AppConfig::from_vars(vars(&[
            ("PATH", "/usr/bin"),
            ("OPENAI_API_KEY", "sk-plain"),
        ]))
        .unwrap();

        assert!(config.validate().is_ok());
    }
}
