//! System prompt profile selection

use serde::Deserialize;

use crate::domain::chat::{DirectiveCatalog, SystemDirective, DEFAULT_PROFILE};

use super::error::ValidationError;

/// Which system directive the assembler injects.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_profile")]
    pub profile: String,

    /// YAML file with extra `profiles: [{name, directive}]`
    pub profiles_path: Option<String>,
}

impl PromptConfig {
    /// Built-in profiles plus those from `profiles_path`.
    pub fn catalog(&self) -> Result<DirectiveCatalog, ValidationError> {
        let mut catalog = DirectiveCatalog::builtin();

        if let Some(path) = self.profiles_path.as_deref().filter(|p| !p.trim().is_empty()) {
            let yaml = std::fs::read_to_string(path)
                .map_err(|e| ValidationError::PromptProfiles(format!("{}: {}", path, e)))?;
            catalog
                .extend_from_yaml(&yaml)
                .map_err(|e| ValidationError::PromptProfiles(format!("{}: {}", path, e)))?;
        }

        Ok(catalog)
    }

    /// The selected directive.
    pub fn directive(&self) -> Result<SystemDirective, ValidationError> {
        self.catalog()?
            .select(&self.profile)
            .map_err(|e| ValidationError::PromptProfiles(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.directive().map(|_| ())
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            profiles_path: None,
        }
    }
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}
