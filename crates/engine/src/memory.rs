//! In-memory spreadsheet backend.
//!
//! [`MemoryClient`] serves fixed tab metadata and range values and counts the
//! requests it receives. Only built for tests, or for consumers that enable
//! the `test-utils` feature.

use crate::{Error, MajorDimension, RawTable, Result, SheetsClient, TabMetadata};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct MemorySpreadsheet {
    tabs: Vec<TabMetadata>,
    values: HashMap<String, RawTable>,
}

/// A [`SheetsClient`] backed by in-memory data
#[derive(Debug, Default)]
pub struct MemoryClient {
    spreadsheets: HashMap<String, MemorySpreadsheet>,
    metadata_delay: Option<Duration>,
    metadata_calls: AtomicUsize,
    range_calls: AtomicUsize,
    requested_ranges: Mutex<Vec<String>>,
}

impl MemoryClient {
    /// Create a client with no spreadsheets
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a spreadsheet with the given tabs
    #[must_use]
    pub fn with_spreadsheet(mut self, spreadsheet_id: &str, tabs: Vec<TabMetadata>) -> Self {
        self.spreadsheets
            .entry(spreadsheet_id.to_string())
            .or_default()
            .tabs = tabs;
        self
    }

    /// Serve `table` for reads of the exact range expression `range`
    #[must_use]
    pub fn with_values(mut self, spreadsheet_id: &str, range: &str, table: RawTable) -> Self {
        self.spreadsheets
            .entry(spreadsheet_id.to_string())
            .or_default()
            .values
            .insert(range.to_string(), table);
        self
    }

    /// Delay every metadata response
    #[must_use]
    pub fn with_metadata_delay(mut self, delay: Duration) -> Self {
        self.metadata_delay = Some(delay);
        self
    }

    /// Number of metadata requests served so far
    #[must_use]
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Number of range reads served so far
    #[must_use]
    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    /// Range expressions requested so far, in order
    #[must_use]
    pub fn requested_ranges(&self) -> Vec<String> {
        self.requested_ranges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn spreadsheet(&self, spreadsheet_id: &str, operation: &str) -> Result<&MemorySpreadsheet> {
        self.spreadsheets.get(spreadsheet_id).ok_or_else(|| {
            Error::backend(operation, Some(404), "Requested entity was not found.")
        })
    }
}

#[async_trait]
impl SheetsClient for MemoryClient {
    async fn tab_metadata(&self, spreadsheet_id: &str) -> Result<Vec<TabMetadata>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.metadata_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.spreadsheet(spreadsheet_id, "get metadata")?.tabs.clone())
    }

    async fn range_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        _major_dimension: MajorDimension,
    ) -> Result<RawTable> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_ranges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(range.to_string());

        self.spreadsheet(spreadsheet_id, "get values")?
            .values
            .get(range)
            .cloned()
            .ok_or_else(|| {
                Error::backend(
                    "get values",
                    Some(400),
                    format!("Unable to parse range: {range}"),
                )
            })
    }
}
