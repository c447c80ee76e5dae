//! In-memory lead store for tests and local runs without credentials.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::lead::LeadRecord;
use crate::ports::{LeadStore, LeadStoreError};

/// Collects appended rows; can be told to fail every append.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeadStore {
    rows: Arc<Mutex<Vec<[String; 7]>>>,
    attempts: Arc<AtomicUsize>,
    failure: Option<LeadStoreError>,
    delay: Duration,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every append fails with `error`.
    pub fn failing(error: LeadStoreError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Rows appended so far, in order.
    pub fn rows(&self) -> Vec<[String; 7]> {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of append calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn append(&self, record: &LeadRecord) -> Result<(), LeadStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.to_row());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
