//! Lenient parsing of the extraction model's reply.
//!
//! Models routinely wrap JSON in markdown fences or add a sentence of prose
//! around it. The reply is unwrapped before parsing; anything that still
//! fails is a [`LeadParseError`].

use thiserror::Error;

use super::extracted::ExtractedLead;

/// Why a reply could not be turned into an [`ExtractedLead`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeadParseError {
    #[error("empty response")]
    Empty,

    #[error("no JSON object in response")]
    NoJsonObject,

    #[error("malformed JSON: {0}")]
    Malformed(String),
}

/// Parses a model reply into a lead.
pub fn parse_extracted_lead(raw: &str) -> Result<ExtractedLead, LeadParseError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(LeadParseError::Empty);
    }

    let start = body.find('{').ok_or(LeadParseError::NoJsonObject)?;
    let object = balanced_object(body, start).ok_or(LeadParseError::NoJsonObject)?;

    serde_json::from_str(object).map_err(|e| LeadParseError::Malformed(e.to_string()))
}

/// Returns the content of the first fenced block, or the trimmed input
/// when there is no complete fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let after_ticks = &trimmed[open + 3..];
    // Skip the language tag on the opening fence line, if any.
    let content_start = match after_ticks.find('\n') {
        Some(newline) if is_language_tag(&after_ticks[..newline]) => newline + 1,
        _ => after_ticks
            .len()
            .min(after_ticks.chars().take_while(|c| c.is_ascii_alphanumeric()).count()),
    };
    let content = &after_ticks[content_start..];

    match content.find("```") {
        Some(close) => content[..close].trim(),
        None => trimmed,
    }
}

fn is_language_tag(line: &str) -> bool {
    line.trim().chars().all(|c| c.is_ascii_alphanumeric())
}

fn balanced_object(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
