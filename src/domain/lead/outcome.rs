//! Explicit outcomes of the lead pipeline.
//!
//! Both "no lead" and "attempt failed" look identical to the caller, but
//! they are kept apart here so logs can tell them apart.

use thiserror::Error;

use super::extracted::ExtractedLead;
use super::parse::LeadParseError;

/// Why an extraction attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("completion call failed: {0}")]
    Completion(String),

    #[error("completion call timed out after {0}s")]
    Timeout(u64),

    #[error("unusable response: {0}")]
    Unparseable(#[from] LeadParseError),
}

/// Result of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// A lead with an email or phone number.
    Lead(ExtractedLead),
    /// The attempt worked but found no email or phone.
    NoContact,
    /// The attempt itself failed.
    Failed(ExtractionFailure),
}

impl ExtractionOutcome {
    /// Classifies a parsed lead by its recomputed contact flag.
    pub fn from_lead(lead: ExtractedLead) -> Self {
        if lead.has_contact_info() {
            Self::Lead(lead)
        } else {
            Self::NoContact
        }
    }

    /// The lead, if one with contact details was found.
    pub fn lead(&self) -> Option<&ExtractedLead> {
        match self {
            Self::Lead(lead) => Some(lead),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lead(_) => "lead",
            Self::NoContact => "no_contact",
            Self::Failed(_) => "failed",
        }
    }
}

/// Result of one sink invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    /// Exactly one row was appended.
    Appended,
    /// Nothing was written.
    Failed(String),
}

impl SinkOutcome {
    /// Boolean success view.
    pub fn is_appended(&self) -> bool {
        matches!(self, Self::Appended)
    }
}
