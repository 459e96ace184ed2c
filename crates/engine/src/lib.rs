//! Spreadsheet-to-config sync engine.
//!
//! Pulls tabs out of remote spreadsheets and writes them as structured JSON
//! config files:
//!
//! - [`SheetFetcher`] resolves a numeric tab id to its title through the
//!   [`SheetNameCache`] and reads the requested range via a [`SheetsClient`]
//! - a [`SheetParser`] picked from the [`ParserRegistry`] by tag turns the
//!   [`RawTable`] into a [`Document`], coercing cells with [`coerce`]
//! - a [`ConfigWriter`] stores the document under the sheet's output name
//! - [`SyncEngine`] runs the pipeline for every sheet of every spreadsheet in
//!   a [`SyncManifest`] and collects a [`SyncReport`]
//!
//! # Example
//!
//! ```ignore
//! use sheetsync_engine::{FsConfigWriter, ParserRegistry, SyncEngine};
//!
//! let engine = SyncEngine::new(
//!     client,
//!     ParserRegistry::with_builtins(),
//!     Arc::new(FsConfigWriter::new("Assets/Configs")),
//! );
//! let report = engine.sync_all(&manifest.spreadsheets).await;
//! for failure in report.failures() {
//!     eprintln!("{}: {:?}", failure.output, failure.error());
//! }
//! ```

mod cache;
mod client;
mod engine;
mod error;
mod fetcher;
mod manifest;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
pub mod parser;
mod value;
mod writer;

pub use cache::SheetNameCache;
pub use client::{MajorDimension, RawTable, SheetsClient, TabMetadata};
pub use engine::{SheetOutcome, SyncEngine, SyncOptions, SyncReport};
pub use error::{Error, Result};
pub use fetcher::{SheetFetcher, range_expression};
pub use manifest::{SheetConfig, SpreadsheetConfig, SyncManifest, load_manifest};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryClient;
pub use parser::{DefaultParser, Document, ParserRegistry, SheetParser};
pub use value::{TypedValue, cell_text, coerce};
pub use writer::{ConfigWriter, FileStatus, FsConfigWriter, WrittenFile};
