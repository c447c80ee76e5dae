//! Agency Concierge - streaming insurance-agency chat with lead capture.
//!
//! A caller posts a conversation; the answer is relayed token by token as
//! server-sent events. Once the answer is complete the recent user turns
//! are mined for contact details, and a lead with an email or phone number
//! is appended to a spreadsheet. Lead capture never affects the answer.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
