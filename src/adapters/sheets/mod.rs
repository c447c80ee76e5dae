//! Lead store adapters.
//!
//! - `GoogleSheetsLeadStore` - appends rows to a Google spreadsheet
//! - `InMemoryLeadStore` - keeps rows in memory

mod google_sheets_store;
mod in_memory_store;
mod service_account;

pub use google_sheets_store::{GoogleSheetsConfig, GoogleSheetsLeadStore};
pub use in_memory_store::InMemoryLeadStore;
pub use service_account::{
    AccessTokenSource, ServiceAccountKey, ServiceAccountTokenSource, StaticTokenSource,
};
