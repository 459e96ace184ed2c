//! Tab-title cache keyed by spreadsheet id.
//!
//! Range reads address tabs by title, while the manifest names them by their
//! stable numeric id. The first lookup for a spreadsheet fetches the metadata
//! of all of its tabs in one call; every later lookup for that spreadsheet is
//! answered from memory, including lookups for ids that do not exist.
//!
//! Population is single-flight: concurrent lookups for the same spreadsheet
//! wait on one metadata request. A failed request leaves the entry empty so
//! the next lookup retries.

use crate::{Error, Result, SheetsClient, TabMetadata};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

type TabIndex = Arc<OnceCell<Arc<[TabMetadata]>>>;

/// Per-spreadsheet index of tab id to tab title
#[derive(Debug, Default)]
pub struct SheetNameCache {
    entries: Mutex<HashMap<String, TabIndex>>,
}

impl SheetNameCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the title of `tab_id` in `spreadsheet_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lookup` if the spreadsheet has no tab with that id, or
    /// the client's error if the metadata request fails.
    pub async fn resolve(
        &self,
        client: &dyn SheetsClient,
        spreadsheet_id: &str,
        tab_id: i64,
    ) -> Result<String> {
        let tabs = self.tabs(client, spreadsheet_id).await?;
        tabs.iter()
            .find(|tab| tab.tab_id == tab_id)
            .map(|tab| tab.title.clone())
            .ok_or_else(|| Error::lookup(spreadsheet_id, tab_id))
    }

    /// All tabs of a spreadsheet, fetching them on first use.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the metadata request fails.
    pub async fn tabs(
        &self,
        client: &dyn SheetsClient,
        spreadsheet_id: &str,
    ) -> Result<Arc<[TabMetadata]>> {
        let cell = self.entry(spreadsheet_id);
        let tabs = cell
            .get_or_try_init(|| async {
                tracing::debug!(spreadsheet_id, "Fetching tab metadata");
                let tabs = client.tab_metadata(spreadsheet_id).await?;
                tracing::debug!(spreadsheet_id, tabs = tabs.len(), "Indexed spreadsheet tabs");
                Ok::<_, Error>(Arc::from(tabs))
            })
            .await?;
        Ok(Arc::clone(tabs))
    }

    /// Whether metadata for the spreadsheet has been fetched
    #[must_use]
    pub fn is_indexed(&self, spreadsheet_id: &str) -> bool {
        self.lock()
            .get(spreadsheet_id)
            .is_some_and(|cell| cell.initialized())
    }

    /// Forget the metadata of one spreadsheet
    pub fn invalidate(&self, spreadsheet_id: &str) {
        if self.lock().remove(spreadsheet_id).is_some() {
            tracing::debug!(spreadsheet_id, "Invalidated tab metadata");
        }
    }

    /// Forget all cached metadata
    pub fn reset(&self) {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        tracing::debug!(spreadsheets = count, "Reset tab metadata cache");
    }

    fn entry(&self, spreadsheet_id: &str) -> TabIndex {
        Arc::clone(self.lock().entry(spreadsheet_id.to_string()).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TabIndex>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
