//! Structured contact guess produced by the extractor.

use serde::{Deserialize, Deserializer, Serialize};

/// Contact details guessed from a conversation.
///
/// Every field is optional. Blank strings and `null` both mean absent;
/// numbers (common for `num_employees`) are kept as their decimal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedLead {
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub business_type: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub num_employees: Option<String>,
    /// What the model claimed. Never trusted; see [`Self::has_contact_info`].
    #[serde(rename = "has_contact_info", deserialize_with = "lenient_flag")]
    pub claimed_contact_info: Option<bool>,
}

impl ExtractedLead {
    /// True iff email or phone is non-empty after trimming.
    pub fn has_contact_info(&self) -> bool {
        is_present(&self.email) || is_present(&self.phone)
    }

    /// True when the model's own flag disagrees with the recomputed one.
    pub fn claim_disagrees(&self) -> bool {
        self.claimed_contact_info
            .is_some_and(|claimed| claimed != self.has_contact_info())
    }
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("null"))
                .then(|| trimmed.to_string())
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
