//! Application layer - handlers that orchestrate the domain over the ports.

pub mod handlers;

pub use handlers::{
    CaptureMode, ChatEvent, ChatEventStream, LeadCapture, LeadExtractor, LeadSink,
    StreamChatHandler, StreamingRelay,
};
