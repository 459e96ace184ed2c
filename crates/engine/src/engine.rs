//! Sync orchestration: fetch → parse → write for every configured sheet.
//!
//! Syncing is best-effort. A failing sheet is recorded in the [`SyncReport`]
//! and logged; its siblings are still attempted.

use crate::{
    ConfigWriter, Error, ParserRegistry, Result, SheetConfig, SheetFetcher, SheetsClient,
    SpreadsheetConfig, WrittenFile,
};
use futures::StreamExt;
use std::sync::Arc;
use tracing::instrument;

/// Options controlling a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Number of spreadsheets synced at the same time. Sheets inside one
    /// spreadsheet always run one after another.
    pub concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Outcome of syncing one sheet
#[derive(Debug)]
pub struct SheetOutcome {
    /// Spreadsheet the sheet belongs to
    pub spreadsheet_id: String,
    /// Tab that was read
    pub tab_id: i64,
    /// Output name from the manifest
    pub output: String,
    /// Parser tag from the manifest
    pub parser: String,
    /// Written file, or why the sheet failed
    pub result: Result<WrittenFile>,
}

impl SheetOutcome {
    fn new(
        spreadsheet: &SpreadsheetConfig,
        sheet: &SheetConfig,
        result: Result<WrittenFile>,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet.id.clone(),
            tab_id: sheet.tab_id,
            output: sheet.output.clone(),
            parser: sheet.parser.clone(),
            result,
        }
    }

    /// The error, if the sheet failed
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

/// Per-sheet outcomes of a sync run, in manifest order
#[derive(Debug, Default)]
pub struct SyncReport {
    /// One entry per configured sheet
    pub outcomes: Vec<SheetOutcome>,
}

impl SyncReport {
    /// Files that were written (or would be, in dry-run mode)
    pub fn written(&self) -> impl Iterator<Item = &WrittenFile> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Sheets that failed
    pub fn failures(&self) -> impl Iterator<Item = &SheetOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Number of failed sheets
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when every sheet synced
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    fn extend(&mut self, other: Self) {
        self.outcomes.extend(other.outcomes);
    }
}

/// Pulls configured sheets and writes them as config files
pub struct SyncEngine {
    fetcher: SheetFetcher,
    parsers: ParserRegistry,
    writer: Arc<dyn ConfigWriter>,
    options: SyncOptions,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("fetcher", &self.fetcher)
            .field("parsers", &self.parsers)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Create an engine with default options
    #[must_use]
    pub fn new(
        client: Arc<dyn SheetsClient>,
        parsers: ParserRegistry,
        writer: Arc<dyn ConfigWriter>,
    ) -> Self {
        Self {
            fetcher: SheetFetcher::new(client),
            parsers,
            writer,
            options: SyncOptions::default(),
        }
    }

    /// Replace the run options
    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// The parser registry
    #[must_use]
    pub const fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    /// Forget all cached tab metadata
    pub fn reset_cache(&self) {
        self.fetcher.cache().reset();
    }

    /// Forget the cached tab metadata of one spreadsheet
    pub fn invalidate(&self, spreadsheet_id: &str) {
        self.fetcher.cache().invalidate(spreadsheet_id);
    }

    /// Sync every spreadsheet, returning one outcome per sheet in manifest order.
    #[instrument(skip_all, fields(spreadsheets = configs.len()))]
    pub async fn sync_all(&self, configs: &[SpreadsheetConfig]) -> SyncReport {
        let reports: Vec<SyncReport> = futures::stream::iter(configs)
            .map(|config| self.sync_one(config))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut report = SyncReport::default();
        for partial in reports {
            report.extend(partial);
        }

        tracing::info!(
            sheets = report.outcomes.len(),
            failed = report.failure_count(),
            "Sync finished"
        );
        report
    }

    /// Sync the sheets of one spreadsheet, in order.
    #[instrument(skip_all, fields(spreadsheet = %config.display_name(), spreadsheet_id = %config.id))]
    pub async fn sync_one(&self, config: &SpreadsheetConfig) -> SyncReport {
        let mut report = SyncReport::default();

        for sheet in &config.sheets {
            let result = self.sync_sheet(config, sheet).await;
            if let Err(error) = &result {
                tracing::error!(
                    spreadsheet_id = %config.id,
                    tab_id = sheet.tab_id,
                    parser = %sheet.parser,
                    output = %sheet.output,
                    error = %error,
                    "Failed to sync sheet"
                );
            }
            report.outcomes.push(SheetOutcome::new(config, sheet, result));
        }

        report
    }

    async fn sync_sheet(
        &self,
        spreadsheet: &SpreadsheetConfig,
        sheet: &SheetConfig,
    ) -> Result<WrittenFile> {
        let parser = self.parsers.resolve(&sheet.parser)?;
        let table = self
            .fetcher
            .fetch(&spreadsheet.id, sheet.tab_id, sheet.range.as_deref())
            .await?;
        let document = parser.parse(sheet.tab_id, &table)?;
        self.writer.write(&sheet.output, &document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, FileStatus, MemoryClient, RawTable, TabMetadata};
    use std::sync::Mutex;

    /// Collects documents instead of writing files
    #[derive(Default)]
    struct RecordingWriter {
        written: Mutex<Vec<(String, Document)>>,
    }

    #[async_trait::async_trait]
    impl ConfigWriter for RecordingWriter {
        async fn write(&self, output_name: &str, document: &Document) -> Result<WrittenFile> {
            self.written
                .lock()
                .unwrap()
                .push((output_name.to_string(), document.clone()));
            Ok(WrittenFile {
                path: format!("{output_name}.json").into(),
                status: FileStatus::Created,
            })
        }
    }

    fn client() -> Arc<MemoryClient> {
        Arc::new(
            MemoryClient::new()
                .with_spreadsheet("book", vec![TabMetadata::new(10, "Items")])
                .with_values(
                    "book",
                    "Items",
                    RawTable::from_strings([vec!["id", "price"], vec!["sword", "10"]]),
                ),
        )
    }

    fn engine(client: Arc<MemoryClient>) -> (Arc<RecordingWriter>, SyncEngine) {
        let writer = Arc::new(RecordingWriter::default());
        let engine = SyncEngine::new(client, ParserRegistry::with_builtins(), writer.clone());
        (writer, engine)
    }

    #[tokio::test]
    async fn test_sync_one_writes_document() {
        let (writer, engine) = engine(client());
        let config =
            SpreadsheetConfig::new("Book", "book").with_sheet(SheetConfig::new("items", 10));

        let report = engine.sync_one(&config).await;

        assert!(report.is_success());
        let written = writer.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, "items");
        assert_eq!(
            written[0].1.value(),
            &serde_json::json!({"sword": {"id": "sword", "price": 10}})
        );
    }

    #[tokio::test]
    async fn test_unknown_parser_is_reported_without_fetching() {
        let client = client();
        let (writer, engine) = engine(client.clone());
        let config = SpreadsheetConfig::new("Book", "book")
            .with_sheet(SheetConfig::new("a", 10).with_parser("custom-missing"))
            .with_sheet(SheetConfig::new("b", 10));

        let report = engine.sync_one(&config).await;

        assert_eq!(report.failure_count(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.output, "a");
        assert!(matches!(failure.error(), Some(Error::ParserNotFound { .. })));
        assert_eq!(client.range_calls(), 1);
        assert_eq!(writer.written.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_cache_forces_refetch() {
        let client = client();
        let (_writer, engine) = engine(client.clone());
        let config =
            SpreadsheetConfig::new("Book", "book").with_sheet(SheetConfig::new("items", 10));

        engine.sync_one(&config).await;
        engine.sync_one(&config).await;
        assert_eq!(client.metadata_calls(), 1);

        engine.reset_cache();
        engine.sync_one(&config).await;
        assert_eq!(client.metadata_calls(), 2);

        engine.invalidate("book");
        engine.sync_one(&config).await;
        assert_eq!(client.metadata_calls(), 3);
    }

    #[tokio::test]
    async fn test_sync_all_keeps_manifest_order_with_concurrency() {
        let client = Arc::new(
            MemoryClient::new()
                .with_spreadsheet("a", vec![TabMetadata::new(1, "A")])
                .with_spreadsheet("b", vec![TabMetadata::new(2, "B")])
                .with_values("a", "A", RawTable::from_strings([vec!["k"], vec!["x"]]))
                .with_values("b", "B", RawTable::from_strings([vec!["k"], vec!["y"]]))
                .with_metadata_delay(std::time::Duration::from_millis(5)),
        );
        let (_writer, engine) = engine(client);
        let engine = engine.with_options(SyncOptions { concurrency: 4 });
        let configs = vec![
            SpreadsheetConfig::new("A", "a").with_sheet(SheetConfig::new("out-a", 1)),
            SpreadsheetConfig::new("B", "b").with_sheet(SheetConfig::new("out-b", 2)),
        ];

        let report = engine.sync_all(&configs).await;

        let outputs: Vec<&str> = report.outcomes.iter().map(|o| o.output.as_str()).collect();
        assert_eq!(outputs, vec!["out-a", "out-b"]);
        assert!(report.is_success());
    }

    #[test]
    fn test_default_options_are_sequential() {
        assert_eq!(SyncOptions::default().concurrency, 1);
    }
}
