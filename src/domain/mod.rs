//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `chat` - Turns, system directives and context assembly
//! - `lead` - Extracted leads, lead records and lead parsing

pub mod chat;
pub mod lead;
