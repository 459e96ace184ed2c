//! Sync manifest: which spreadsheets and tabs to pull, and where to put them.
//!
//! Manifests are TOML (or JSON, chosen by file extension):
//!
//! ```toml
//! root = "Assets/Configs"
//!
//! [[spreadsheets]]
//! name = "Balance"
//! id = "1AbC"
//!
//! [[spreadsheets.sheets]]
//! output = "Enemies/Stats"
//! tab_id = 0
//! range = "A1:F200"
//! parser = "default"
//! ```

use crate::{DefaultParser, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One tab (and optional range) extracted into one config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Output name relative to the project root, without extension
    pub output: String,

    /// Numeric tab id (`gid`)
    pub tab_id: i64,

    /// A1-style range inside the tab; the whole tab when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    /// Tag of the parser that turns the rows into a document
    #[serde(default = "default_parser")]
    pub parser: String,
}

fn default_parser() -> String {
    DefaultParser::TAG.to_string()
}

impl SheetConfig {
    /// Create a sheet config using the default parser and the whole tab
    #[must_use]
    pub fn new(output: impl Into<String>, tab_id: i64) -> Self {
        Self {
            output: output.into(),
            tab_id,
            range: None,
            parser: default_parser(),
        }
    }

    /// Restrict the read to an A1 range
    #[must_use]
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    /// Use a different parser
    #[must_use]
    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = parser.into();
        self
    }
}

/// One remote spreadsheet and the tabs to pull from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetConfig {
    /// Display name
    #[serde(default)]
    pub name: String,

    /// Spreadsheet id (the long token in the document URL)
    pub id: String,

    /// Tabs to extract, in order
    #[serde(default)]
    pub sheets: Vec<SheetConfig>,
}

impl SpreadsheetConfig {
    /// Create a spreadsheet config with no sheets
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            sheets: Vec::new(),
        }
    }

    /// Append a sheet
    #[must_use]
    pub fn with_sheet(mut self, sheet: SheetConfig) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Name for display, falling back to the id
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Browser link to the first configured tab
    ///
    /// ```
    /// use sheetsync_engine::{SheetConfig, SpreadsheetConfig};
    ///
    /// let config = SpreadsheetConfig::new("Balance", "1AbC").with_sheet(SheetConfig::new("items", 42));
    /// assert_eq!(
    ///     config.browser_url().as_deref(),
    ///     Some("https://docs.google.com/spreadsheets/d/1AbC/#gid=42")
    /// );
    /// ```
    #[must_use]
    pub fn browser_url(&self) -> Option<String> {
        self.sheets.first().map(|sheet| {
            format!(
                "https://docs.google.com/spreadsheets/d/{}/#gid={}",
                self.id, sheet.tab_id
            )
        })
    }
}

/// Everything a sync run needs besides credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncManifest {
    /// Project root for outputs, relative to the manifest file
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Timeout for each backend request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of spreadsheets synced concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Spreadsheets to sync, in order
    #[serde(default)]
    pub spreadsheets: Vec<SpreadsheetConfig>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_concurrency() -> usize {
    1
}

impl Default for SyncManifest {
    fn default() -> Self {
        Self {
            root: default_root(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrency: default_concurrency(),
            spreadsheets: Vec::new(),
        }
    }
}

impl SyncManifest {
    /// Check the manifest for values that can never sync.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::configuration("concurrency must be at least 1"));
        }

        for (i, spreadsheet) in self.spreadsheets.iter().enumerate() {
            if spreadsheet.id.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "spreadsheets[{i}].id cannot be empty"
                )));
            }
            for (j, sheet) in spreadsheet.sheets.iter().enumerate() {
                if sheet.output.trim().is_empty() {
                    return Err(Error::configuration(format!(
                        "spreadsheets[{i}].sheets[{j}].output cannot be empty"
                    )));
                }
                if sheet.parser.is_empty() {
                    return Err(Error::configuration(format!(
                        "spreadsheets[{i}].sheets[{j}].parser cannot be empty"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Look up a spreadsheet by display name or id
    #[must_use]
    pub fn find(&self, name_or_id: &str) -> Option<&SpreadsheetConfig> {
        self.spreadsheets
            .iter()
            .find(|s| s.name == name_or_id || s.id == name_or_id)
    }

    /// Output root resolved against the directory holding the manifest
    #[must_use]
    pub fn project_root(&self, manifest_dir: &Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            manifest_dir.join(&self.root)
        }
    }
}

/// Load a manifest-shaped file, choosing TOML or JSON by extension.
///
/// Deserialization errors name the failing field path.
///
/// # Errors
///
/// Returns `Error::Configuration` if the file cannot be read or parsed.
pub fn load_manifest<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::configuration(format!("Failed to read {}: {e}", path.display()))
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        parse_json(&content)
    } else {
        parse_toml(&content)
    };
    parsed.map_err(|message| Error::configuration(format!("{}: {message}", path.display())))
}

fn parse_toml<T: DeserializeOwned>(content: &str) -> std::result::Result<T, String> {
    let value: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    serde_path_to_error::deserialize(value).map_err(|e| format!("{}: {}", e.path(), e.inner()))
}

fn parse_json<T: DeserializeOwned>(content: &str) -> std::result::Result<T, String> {
    let mut deserializer = serde_json::Deserializer::from_str(content);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| format!("{}: {}", e.path(), e.inner()))
}
