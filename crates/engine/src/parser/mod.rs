//! Table parsers.
//!
//! A [`SheetParser`] turns the [`RawTable`] read from one tab into the
//! [`Document`] written to one config file. Parsers are selected per sheet by
//! tag through the [`ParserRegistry`].

mod default;
mod registry;

pub use default::DefaultParser;
pub use registry::ParserRegistry;

use crate::{RawTable, Result};
use serde_json::{Map, Value};

/// Structured parser output, destined for one config file
#[derive(Debug, Clone, PartialEq)]
pub struct Document(Value);

impl Document {
    /// Wrap a JSON value
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// An empty object
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Borrow the underlying value
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.0
    }

    /// Take the underlying value
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serialize as pretty-printed JSON (two-space indent, no trailing newline)
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        // Serializing a Value to a String has no failure path
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(Value::Object(map))
    }
}

/// Converts a raw cell grid into a document.
///
/// Implementations must be stateless with respect to individual calls; the
/// registry hands the same instance to every sheet that uses its tag.
pub trait SheetParser: Send + Sync {
    /// Tag under which this parser is registered (exact, case-sensitive)
    fn tag(&self) -> &str;

    /// Parse the table read from tab `tab_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the table cannot be
    /// represented by this parser.
    fn parse(&self, tab_id: i64, table: &RawTable) -> Result<Document>;
}
