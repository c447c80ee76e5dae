//! Durable lead record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::extracted::ExtractedLead;

/// Column order of the lead table.
pub const LEAD_COLUMNS: [&str; 7] = [
    "timestamp",
    "name",
    "email",
    "phone",
    "business_type",
    "num_employees",
    "notes",
];

/// Timestamp format written to the store (minute precision, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One append-only row in the lead store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadRecord {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub business_type: String,
    pub num_employees: String,
    pub notes: String,
}

impl LeadRecord {
    /// Stamps a lead, defaulting absent fields to empty strings and blank
    /// notes to `default_notes`.
    pub fn from_lead(
        lead: &ExtractedLead,
        at: DateTime<Utc>,
        notes: Option<&str>,
        default_notes: &str,
    ) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(default_notes);

        Self {
            timestamp: at,
            name: text(&lead.name),
            email: text(&lead.email),
            phone: text(&lead.phone),
            business_type: text(&lead.business_type),
            num_employees: text(&lead.num_employees),
            notes: notes.to_string(),
        }
    }

    /// The seven string cells in [`LEAD_COLUMNS`] order.
    pub fn to_row(&self) -> [String; 7] {
        [
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.business_type.clone(),
            self.num_employees.clone(),
            self.notes.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn absent_fields_become_empty_strings() {
        let lead = ExtractedLead {
            email: Some("a@b.com".to_string()),
            ..Default::default()
        };

        let record = LeadRecord::from_lead(&lead, at(), None, "Chatbot lead");

        assert_eq!(
            record.to_row(),
            [
                "2026-03-14 09:26".to_string(),
                String::new(),
                "a@b.com".to_string(),
                String::new(),
                String::new(),
                String::new(),
                "Chatbot lead".to_string(),
            ]
        );
    }

    #[test]
    fn blank_notes_fall_back_to_default() {
        let record = LeadRecord::from_lead(&ExtractedLead::default(), at(), Some("  "), "Chatbot lead");
        assert_eq!(record.notes, "Chatbot lead");
    }

    #[test]
    fn explicit_notes_are_kept() {
        let record =
            LeadRecord::from_lead(&ExtractedLead::default(), at(), Some("Referral"), "Chatbot lead");
        assert_eq!(record.notes, "Referral");
    }

    #[test]
    fn all_fields_map_to_columns() {
        let lead = ExtractedLead {
            name: Some("Dana Reyes".to_string()),
            email: Some("dana@example.com".to_string()),
            phone: Some("555-0100".to_string()),
            business_type: Some("Restaurant".to_string()),
            num_employees: Some("18".to_string()),
            claimed_contact_info: Some(true),
        };

        let row = LeadRecord::from_lead(&lead, at(), None, "Chatbot lead").to_row();
        assert_eq!(row.len(), LEAD_COLUMNS.len());
        assert_eq!(row[1], "Dana Reyes");
        assert_eq!(row[4], "Restaurant");
        assert_eq!(row[5], "18");
    }
}
