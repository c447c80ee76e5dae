//! Lead Store Port - append-only sink for lead records.
//!
//! The store is treated as an opaque table: one operation appends one
//! seven-field row. Implementations must not retry internally; a failure
//! is reported once and the caller decides what to do with it.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::lead::LeadRecord;

/// Port for the durable lead table.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Appends exactly one row.
    async fn append(&self, record: &LeadRecord) -> Result<(), LeadStoreError>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

/// Lead store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeadStoreError {
    #[error("credentials missing or invalid: {0}")]
    InvalidCredentials(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("spreadsheet '{0}' not found")]
    SpreadsheetNotFound(String),

    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("store rejected the append ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("store call timed out after {0}s")]
    Timeout(u64),
}
