//! Lead domain module.
//!
//! Best-effort contact details mined from a conversation, the durable
//! record appended to the lead store, and the explicit outcome types that
//! distinguish "no lead found" from "the attempt failed".

mod extracted;
mod outcome;
mod parse;
mod record;

pub use extracted::ExtractedLead;
pub use outcome::{ExtractionFailure, ExtractionOutcome, SinkOutcome};
pub use parse::{parse_extracted_lead, strip_code_fences, LeadParseError};
pub use record::{LeadRecord, LEAD_COLUMNS, TIMESTAMP_FORMAT};
