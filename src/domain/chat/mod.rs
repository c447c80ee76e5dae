//! Chat domain module.
//!
//! Conversation turns, named system directives, and the context assembler
//! that turns a caller's conversation into the exact message sequence sent
//! to the completion service.

mod assembler;
mod directive;
mod turn;

pub use assembler::{AssemblyError, ContextAssembler};
pub use directive::{DirectiveCatalog, DirectiveError, SystemDirective, DEFAULT_PROFILE};
pub use turn::{ConversationRequest, Role, Turn};
