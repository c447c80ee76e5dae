//! Post-stream lead capture: extract once, then sink at most once.

use crate::domain::chat::ConversationRequest;
use crate::domain::lead::{ExtractionOutcome, SinkOutcome};

use super::extract_lead::LeadExtractor;
use super::record_lead::LeadSink;

/// What one capture run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub extraction: ExtractionOutcome,
    /// `None` when the sink was not invoked.
    pub sink: Option<SinkOutcome>,
}

impl CaptureReport {
    pub fn lead_recorded(&self) -> bool {
        self.sink.as_ref().is_some_and(SinkOutcome::is_appended)
    }
}

pub struct LeadCapture {
    extractor: LeadExtractor,
    sink: LeadSink,
}

impl LeadCapture {
    pub fn new(extractor: LeadExtractor, sink: LeadSink) -> Self {
        Self { extractor, sink }
    }

    /// Runs extraction and, for a lead with contact details, one append.
    pub async fn capture(&self, request: &ConversationRequest) -> CaptureReport {
        let extraction = self.extractor.extract(request).await;

        let sink = match &extraction {
            ExtractionOutcome::Lead(lead) => Some(self.sink.record(lead, None).await),
            ExtractionOutcome::NoContact => None,
            ExtractionOutcome::Failed(failure) => {
                tracing::warn!(error = %failure, "Lead extraction failed");
                None
            }
        };

        let report = CaptureReport { extraction, sink };
        tracing::info!(
            extraction = report.extraction.label(),
            recorded = report.lead_recorded(),
            "Lead capture finished"
        );
        report
    }
}
