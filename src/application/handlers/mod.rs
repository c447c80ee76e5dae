//! Command handlers for the chat pipeline.

mod capture_lead;
mod extract_lead;
mod record_lead;
mod relay;
mod stream_chat;

pub use capture_lead::{CaptureReport, LeadCapture};
pub use extract_lead::{ExtractionSettings, LeadExtractor};
pub use record_lead::{LeadSink, SinkSettings};
pub use relay::{
    AccumulatedAnswer, ChatEvent, RelayFailure, RelayOutcome, RelaySettings, StreamingRelay,
};
pub use stream_chat::{CaptureMode, ChatEventStream, StreamChatHandler};
