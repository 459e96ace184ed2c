//! Sheet fetching: tab id + range → raw cell grid.

use crate::{MajorDimension, RawTable, Result, SheetNameCache, SheetsClient};
use std::sync::Arc;

/// Compose a range expression from a tab title and an optional A1 range.
///
/// An empty range selects the whole tab.
///
/// ```
/// use sheetsync_engine::range_expression;
///
/// assert_eq!(range_expression("Items", Some("A1:C10")), "Items!A1:C10");
/// assert_eq!(range_expression("Items", None), "Items");
/// assert_eq!(range_expression("Items", Some("")), "Items");
/// ```
#[must_use]
pub fn range_expression(title: &str, range: Option<&str>) -> String {
    match range.filter(|r| !r.is_empty()) {
        Some(range) => format!("{title}!{range}"),
        None => title.to_string(),
    }
}

/// Reads tabs by numeric id through a [`SheetsClient`]
///
/// Owns the [`SheetNameCache`] used to turn tab ids into titles.
pub struct SheetFetcher {
    client: Arc<dyn SheetsClient>,
    cache: SheetNameCache,
}

impl std::fmt::Debug for SheetFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetFetcher")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SheetFetcher {
    /// Create a fetcher with an empty cache
    #[must_use]
    pub fn new(client: Arc<dyn SheetsClient>) -> Self {
        Self {
            client,
            cache: SheetNameCache::new(),
        }
    }

    /// The tab-title cache
    #[must_use]
    pub const fn cache(&self) -> &SheetNameCache {
        &self.cache
    }

    /// Fetch the cells of `range` (or the whole tab) from tab `tab_id`.
    ///
    /// Rows come back exactly as the backend returned them, in row-major
    /// order; ragged rows are not padded.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lookup` if the tab id does not exist and
    /// `Error::Backend` if a remote call fails.
    pub async fn fetch(
        &self,
        spreadsheet_id: &str,
        tab_id: i64,
        range: Option<&str>,
    ) -> Result<RawTable> {
        let title = self
            .cache
            .resolve(self.client.as_ref(), spreadsheet_id, tab_id)
            .await?;
        let expression = range_expression(&title, range);

        tracing::debug!(spreadsheet_id, tab_id, range = %expression, "Reading sheet range");
        let table = self
            .client
            .range_values(spreadsheet_id, &expression, MajorDimension::Rows)
            .await?;
        tracing::debug!(spreadsheet_id, tab_id, rows = table.len(), "Read sheet range");

        Ok(table)
    }
}
