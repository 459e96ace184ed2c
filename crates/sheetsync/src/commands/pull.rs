//! `sheetsync pull`: fetch, parse and write every configured sheet.

use super::CommandOutput;
use crate::cli::CliError;
use crate::project::Project;
use sheetsync_engine::{
    FsConfigWriter, ParserRegistry, SheetsClient, SyncEngine, SyncOptions, SyncReport,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Options for a pull run
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Spreadsheet names or ids to restrict the run to; empty means all
    pub only: Vec<String>,
    /// Report changes without writing
    pub dry_run: bool,
}

/// Connect to the backend and pull the selected spreadsheets.
///
/// # Errors
///
/// Returns a `CliError` if the selection is invalid or authorization fails.
/// Per-sheet failures are reported in the output instead.
#[instrument(name = "pull", skip_all, fields(dry_run = options.dry_run))]
pub async fn execute_pull(
    project: &Project,
    options: &PullOptions,
    cancel: &CancellationToken,
) -> Result<CommandOutput, CliError> {
    // Fail on a bad --only before spending a network round trip
    project.select(&options.only)?;

    let client: Arc<dyn SheetsClient> = project.provider().get_or_connect(cancel).await?;
    pull_with_client(project, client, options).await
}

/// Pull the selected spreadsheets through an already connected client.
///
/// # Errors
///
/// Returns `CliError::Config` if `options.only` names an unknown spreadsheet.
pub async fn pull_with_client(
    project: &Project,
    client: Arc<dyn SheetsClient>,
    options: &PullOptions,
) -> Result<CommandOutput, CliError> {
    let spreadsheets = project.select(&options.only)?;
    if spreadsheets.iter().all(|s| s.sheets.is_empty()) {
        return Ok(CommandOutput::ok(
            "No sheets configured. Add [[spreadsheets.sheets]] entries to the manifest.",
        ));
    }

    let root = project.output_root();
    let writer = FsConfigWriter::new(&root).dry_run(options.dry_run);
    let engine = SyncEngine::new(client, ParserRegistry::with_builtins(), Arc::new(writer))
        .with_options(SyncOptions {
            concurrency: project.manifest.concurrency,
        });

    let report = engine.sync_all(&spreadsheets).await;
    Ok(CommandOutput {
        text: format_report(&report, &root),
        success: report.is_success(),
    })
}

/// One line per sheet, then a summary line.
#[must_use]
pub fn format_report(report: &SyncReport, root: &Path) -> String {
    let mut lines = Vec::with_capacity(report.outcomes.len() + 1);

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(written) => {
                let path = written.path.strip_prefix(root).unwrap_or(&written.path);
                lines.push(format!("{} {}", written.status, path.display()));
            }
            Err(error) => lines.push(format!(
                "Failed {} (spreadsheet {}, tab {}, parser '{}'): {error}",
                outcome.output, outcome.spreadsheet_id, outcome.tab_id, outcome.parser
            )),
        }
    }

    let failed = report.failure_count();
    let total = report.outcomes.len();
    if failed == 0 {
        lines.push(format!("Synced {total} sheet(s)"));
    } else {
        lines.push(format!("Synced {} of {total} sheet(s), {failed} failed", total - failed));
    }

    lines.join("\n")
}
