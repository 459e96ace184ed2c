//! Spreadsheet backend abstraction.
//!
//! The engine never talks HTTP itself. It depends on a [`SheetsClient`], which
//! provider crates (e.g. `sheetsync-google`) implement on top of an
//! authenticated connection.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of one tab inside a spreadsheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabMetadata {
    /// Stable numeric tab id (the `gid` in sheet URLs)
    pub tab_id: i64,
    /// Current display title
    pub title: String,
}

impl TabMetadata {
    /// Create tab metadata
    #[must_use]
    pub fn new(tab_id: i64, title: impl Into<String>) -> Self {
        Self {
            tab_id,
            title: title.into(),
        }
    }
}

/// Ordering of the value grid returned by a range read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MajorDimension {
    /// Outer sequence is rows
    #[default]
    Rows,
    /// Outer sequence is columns
    Columns,
}

impl MajorDimension {
    /// Wire name used by the Sheets API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rows => "ROWS",
            Self::Columns => "COLUMNS",
        }
    }
}

impl std::fmt::Display for MajorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cell grid returned by a range read.
///
/// Row-major, returned verbatim: rows may be shorter than the header row and
/// cells are whatever scalar the backend produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Rows of raw cells
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    /// Wrap a grid of cells
    #[must_use]
    pub const fn new(rows: Vec<Vec<Value>>) -> Self {
        Self { rows }
    }

    /// Build a table of string cells
    #[must_use]
    pub fn from_strings<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| Value::String(c.into())).collect())
                .collect(),
        }
    }

    /// True when the grid has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows, header included
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Read-only access to a spreadsheet backend.
///
/// Implementations report every remote failure (transport, permission,
/// quota, invalid range) as [`Error::Backend`](crate::Error::Backend).
#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Fetch metadata for every tab in the spreadsheet, without grid data.
    async fn tab_metadata(&self, spreadsheet_id: &str) -> Result<Vec<TabMetadata>>;

    /// Read the values of a range expression (`"Title"` or `"Title!A1:B10"`).
    async fn range_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        major_dimension: MajorDimension,
    ) -> Result<RawTable>;
}
