//! Lead sink: stamps a lead and appends it to the store exactly once.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::domain::lead::{ExtractedLead, LeadRecord, SinkOutcome};
use crate::ports::{LeadStore, LeadStoreError};

#[derive(Debug, Clone)]
pub struct SinkSettings {
    /// Notes written when none are supplied.
    pub default_notes: String,
    pub timeout: Duration,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            default_notes: "Chatbot lead".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Clone)]
pub struct LeadSink {
    store: Arc<dyn LeadStore>,
    settings: SinkSettings,
}

impl LeadSink {
    pub fn new(store: Arc<dyn LeadStore>, settings: SinkSettings) -> Self {
        Self { store, settings }
    }

    /// Appends the lead stamped with the current time.
    pub async fn record(&self, lead: &ExtractedLead, notes: Option<&str>) -> SinkOutcome {
        self.record_at(lead, notes, Utc::now()).await
    }

    /// Appends the lead stamped with `at`.
    ///
    /// Leads without an email or phone are refused without touching the store.
    pub async fn record_at(
        &self,
        lead: &ExtractedLead,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> SinkOutcome {
        if !lead.has_contact_info() {
            return SinkOutcome::Failed("lead has no email or phone".to_string());
        }

        let record = LeadRecord::from_lead(lead, at, notes, &self.settings.default_notes);

        let result = match timeout(self.settings.timeout, self.store.append(&record)).await {
            Ok(result) => result,
            Err(_) => Err(LeadStoreError::Timeout(self.settings.timeout.as_secs())),
        };

        match result {
            Ok(()) => {
                tracing::info!(store = %self.store.describe(), "Lead appended");
                SinkOutcome::Appended
            }
            Err(e) => {
                tracing::warn!(store = %self.store.describe(), error = %e, "Lead append failed");
                SinkOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sheets::InMemoryLeadStore;
    use chrono::TimeZone;

    fn lead(email: Option<&str>, phone: Option<&str>) -> ExtractedLead {
        ExtractedLead {
            name: Some("Jo".to_string()),
            email: email.map(String::from),
            phone: phone.map(String::from),
            ..Default::default()
        }
    }

    fn sink(store: &InMemoryLeadStore) -> LeadSink {
        LeadSink::new(
            Arc::new(store.clone()),
            SinkSettings {
                timeout: Duration::from_millis(200),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn appends_one_row_with_defaults() {
        let store = InMemoryLeadStore::new();
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 14, 3, 0).unwrap();

        let outcome = sink(&store).record_at(&lead(None, Some("555-0100")), None, at).await;

        assert!(outcome.is_appended());
        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            [
                "2026-05-01 14:03".to_string(),
                "Jo".to_string(),
                String::new(),
                "555-0100".to_string(),
                String::new(),
                String::new(),
                "Chatbot lead".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn refuses_lead_without_contact() {
        let store = InMemoryLeadStore::new();

        let outcome = sink(&store).record(&lead(Some(" "), None), None).await;

        assert!(!outcome.is_appended());
        assert!(store.rows().is_empty());
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn store_failure_becomes_failed_outcome() {
        let store = InMemoryLeadStore::failing(LeadStoreError::Unreachable("down".to_string()));

        let outcome = sink(&store).record(&lead(Some("jo@x.com"), None), None).await;

        assert_eq!(
            outcome,
            SinkOutcome::Failed("store unreachable: down".to_string())
        );
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let store = InMemoryLeadStore::new().with_delay(Duration::from_secs(5));

        let outcome = sink(&store).record(&lead(Some("jo@x.com"), None), None).await;

        assert!(matches!(outcome, SinkOutcome::Failed(message) if message.contains("timed out")));
    }

    #[tokio::test]
    async fn explicit_notes_are_kept() {
        let store = InMemoryLeadStore::new();

        sink(&store)
            .record(&lead(Some("jo@x.com"), None), Some("Referred by broker"))
            .await;

        assert_eq!(store.rows()[0][6], "Referred by broker");
    }
}
