//! Wires configuration into the running service.

use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;

use crate::adapters::ai::{OpenAIConfig, OpenAIProvider};
use crate::adapters::http::{AppState, HttpSettings};
use crate::adapters::sheets::{
    GoogleSheetsConfig, GoogleSheetsLeadStore, ServiceAccountKey, ServiceAccountTokenSource,
};
use crate::application::handlers::{
    ExtractionSettings, LeadCapture, LeadExtractor, LeadSink, RelaySettings, SinkSettings,
    StreamChatHandler, StreamingRelay,
};
use crate::config::{AppConfig, LeadsConfig, ValidationError};
use crate::domain::chat::ContextAssembler;
use crate::ports::{AIError, AIProvider, LeadStore, LeadStoreError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("completion provider: {0}")]
    Provider(#[from] AIError),
}

/// Builds the chat handler and its collaborators from configuration.
pub fn build_chat_handler(config: &AppConfig) -> Result<StreamChatHandler, BootstrapError> {
    let directive = config.prompt.directive()?;
    tracing::info!(profile = %directive.name, "System directive selected");

    let ai = &config.ai;
    let api_key = ai
        .openai_api_key
        .clone()
        .ok_or(ValidationError::MissingRequired("OPENAI_API_KEY"))?;
    let provider: Arc<dyn AIProvider> = Arc::new(OpenAIProvider::new(
        OpenAIConfig::new(api_key)
            .with_model(ai.chat_model.clone())
            .with_base_url(ai.base_url.clone())
            .with_connect_timeout(ai.connect_timeout())
            .with_request_timeout(ai.request_timeout())
            .with_max_retries(ai.max_retries),
    )?);

    let relay = StreamingRelay::new(
        provider.clone(),
        RelaySettings {
            model: Some(ai.chat_model.clone()),
            max_tokens: ai.max_tokens,
            temperature: ai.temperature,
            idle_timeout: ai.stream_idle_timeout(),
        },
    );
    let handler = StreamChatHandler::new(ContextAssembler::new(directive), relay);

    let Some(store) = lead_store(&config.leads) else {
        return Ok(handler);
    };

    let leads = &config.leads;
    let extractor = LeadExtractor::new(
        provider,
        ExtractionSettings {
            model: Some(ai.extraction_model().to_string()),
            max_tokens: leads.extraction_max_tokens,
            user_turn_window: leads.user_turn_window,
            timeout: leads.extraction_timeout(),
        },
    );
    let sink = LeadSink::new(
        store,
        SinkSettings {
            default_notes: leads.default_notes.clone(),
            timeout: leads.store_timeout(),
        },
    );

    tracing::info!(mode = ?leads.capture_mode, "Lead capture enabled");
    Ok(handler.with_lead_capture(LeadCapture::new(extractor, sink), leads.capture_mode))
}

/// The Sheets store, or `None` when capture is disabled or the credentials
/// are unusable.
fn lead_store(leads: &LeadsConfig) -> Option<Arc<dyn LeadStore>> {
    let Some(json) = leads
        .google_credentials_json
        .as_deref()
        .filter(|_| leads.is_enabled())
    else {
        tracing::info!("No Google credentials configured, lead capture disabled");
        return None;
    };

    match sheets_store(leads, json) {
        Ok(store) => {
            tracing::info!(store = %store.describe(), "Lead store ready");
            Some(Arc::new(store))
        }
        Err(e) => {
            tracing::error!(error = %e, "Google credentials unusable, lead capture disabled");
            None
        }
    }
}

fn sheets_store(leads: &LeadsConfig, json: &str) -> Result<GoogleSheetsLeadStore, LeadStoreError> {
    let client = Client::builder()
        .build()
        .map_err(|e| LeadStoreError::Unreachable(e.to_string()))?;
    let key = ServiceAccountKey::from_json(json)?;
    let tokens = ServiceAccountTokenSource::new(key, client.clone())?;

    let config = GoogleSheetsConfig::new(leads.spreadsheet_name.clone())
        .with_spreadsheet_id(leads.spreadsheet_id.clone())
        .with_worksheet(leads.worksheet.clone());

    Ok(GoogleSheetsLeadStore::new(config, Arc::new(tokens), client))
}

/// Router state and HTTP settings for a configured handler.
pub fn http_parts(config: &AppConfig, chat: Arc<StreamChatHandler>) -> (AppState, HttpSettings) {
    (
        AppState::new(chat, config.server.static_dir()),
        HttpSettings {
            cors_origins: config.server.cors_origins_list(),
            request_timeout: config.server.request_timeout(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        AppConfig::from_vars(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
        .unwrap()
    }

    #[test]
    fn without_credentials_capture_is_disabled() {
        let handler = build_chat_handler(&config(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert!(!handler.lead_capture_enabled());
    }

    #[test]
    fn unusable_credentials_disable_capture() {
        let handler = build_chat_handler(&config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("GOOGLE_CREDENTIALS_JSON", r#"{"client_email":"a@b.c","private_key":"junk"}"#),
        ]))
        .unwrap();
        assert!(!handler.lead_capture_enabled());
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let result = build_chat_handler(&config(&[]));
        assert!(matches!(
            result,
            Err(BootstrapError::Config(ValidationError::MissingRequired(_)))
        ));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let result = build_chat_handler(&config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AGENCY_CONCIERGE__PROMPT__PROFILE", "unknown"),
        ]));
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[test]
    fn http_parts_follow_server_config() {
        let config = config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AGENCY_CONCIERGE__SERVER__CORS_ORIGINS", "https://agency.example"),
        ]);
        let handler = Arc::new(build_chat_handler(&config).unwrap());

        let (state, settings) = http_parts(&config, handler);

        assert_eq!(settings.cors_origins, vec!["https://agency.example"]);
        assert_eq!(state.static_dir, std::path::PathBuf::from("static"));
    }
}
