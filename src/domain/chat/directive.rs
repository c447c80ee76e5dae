//! Named system directives (prompt profiles).
//!
//! The directive is configuration, not logic. A catalog holds every known
//! profile; one is selected at startup and injected into the assembler.
//!
//! Additional profiles can be supplied as YAML:
//!
//! ```yaml
//! profiles:
//!   - name: dental-practice
//!     directive: |
//!       You are the assistant for a dental practice...
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Profile selected when configuration names none.
pub const DEFAULT_PROFILE: &str = "insurance-agency";

const INSURANCE_AGENCY_DIRECTIVE: &str = include_str!("prompts/insurance_agency.md");

/// A named system directive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemDirective {
    /// Profile name used for selection.
    pub name: String,
    /// Text sent as the leading system turn.
    #[serde(rename = "directive")]
    pub text: String,
}

impl SystemDirective {
    /// Creates a directive.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Errors raised while building or querying a catalog.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("invalid profile document: {0}")]
    InvalidDocument(#[from] serde_yaml::Error),

    #[error("profile '{0}' has an empty directive")]
    EmptyDirective(String),

    #[error("unknown prompt profile '{requested}' (known: {known})")]
    UnknownProfile { requested: String, known: String },
}

#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    profiles: Vec<SystemDirective>,
}

/// All prompt profiles known to the process.
#[derive(Debug, Clone)]
pub struct DirectiveCatalog {
    profiles: BTreeMap<String, SystemDirective>,
}

impl DirectiveCatalog {
    /// Catalog containing only the built-in profile.
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            DEFAULT_PROFILE.to_string(),
            SystemDirective::new(DEFAULT_PROFILE, INSURANCE_AGENCY_DIRECTIVE.trim()),
        );
        Self { profiles }
    }

    /// Adds the profiles from a YAML document. Later profiles replace
    /// earlier ones with the same name, including built-ins.
    pub fn extend_from_yaml(&mut self, yaml: &str) -> Result<usize, DirectiveError> {
        let document: ProfileDocument = serde_yaml::from_str(yaml)?;
        let count = document.profiles.len();
        for profile in document.profiles {
            if profile.text.trim().is_empty() {
                return Err(DirectiveError::EmptyDirective(profile.name));
            }
            self.profiles.insert(profile.name.clone(), profile);
        }
        Ok(count)
    }

    /// Looks up a profile by name.
    pub fn get(&self, name: &str) -> Option<&SystemDirective> {
        self.profiles.get(name)
    }

    /// Selects a profile, failing with the list of known names.
    pub fn select(&self, name: &str) -> Result<SystemDirective, DirectiveError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DirectiveError::UnknownProfile {
                requested: name.to_string(),
                known: self.names().join(", "),
            })
    }

    /// Names of all profiles, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

impl Default for DirectiveCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
