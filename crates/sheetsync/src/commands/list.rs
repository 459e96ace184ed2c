//! `sheetsync list`: show configured spreadsheets, optionally with their
//! remote tab titles.

use super::CommandOutput;
use crate::cli::CliError;
use crate::project::Project;
use sheetsync_engine::{SheetNameCache, SyncManifest, TabMetadata};
use std::fmt::Write as _;
use tokio_util::sync::CancellationToken;

/// List the manifest, resolving tab titles when `remote` is set.
///
/// # Errors
///
/// Returns a `CliError` if `remote` is set and authorization fails.
/// Unreachable spreadsheets are reported inline.
pub async fn execute_list(
    project: &Project,
    remote: bool,
    cancel: &CancellationToken,
) -> Result<CommandOutput, CliError> {
    if !remote {
        return Ok(CommandOutput::ok(format_manifest(&project.manifest, None)));
    }

    let client = project.provider().get_or_connect(cancel).await?;
    let cache = SheetNameCache::new();
    let mut remote_tabs = Vec::with_capacity(project.manifest.spreadsheets.len());
    let mut success = true;

    for spreadsheet in &project.manifest.spreadsheets {
        let tabs = cache.tabs(&*client, &spreadsheet.id).await;
        if let Err(error) = &tabs {
            tracing::error!(spreadsheet_id = %spreadsheet.id, error = %error, "Failed to list tabs");
            success = false;
        }
        remote_tabs.push(tabs.map(|t| t.to_vec()).map_err(|e| e.to_string()));
    }

    Ok(CommandOutput {
        text: format_manifest(&project.manifest, Some(&remote_tabs)),
        success,
    })
}

/// Render the manifest as an indented listing.
///
/// With `remote`, one entry per spreadsheet: the tabs it has, or why they
/// could not be read.
#[must_use]
pub fn format_manifest(
    manifest: &SyncManifest,
    remote: Option<&[Result<Vec<TabMetadata>, String>]>,
) -> String {
    if manifest.spreadsheets.is_empty() {
        return "No spreadsheets configured.".to_string();
    }

    let mut out = String::new();
    for (i, spreadsheet) in manifest.spreadsheets.iter().enumerate() {
        let tabs = remote.and_then(|r| r.get(i));
        let _ = writeln!(out, "{} ({})", spreadsheet.display_name(), spreadsheet.id);

        for sheet in &spreadsheet.sheets {
            let range = sheet.range.as_deref().unwrap_or("*");
            let title = match tabs {
                Some(Ok(tabs)) => tabs
                    .iter()
                    .find(|t| t.tab_id == sheet.tab_id)
                    .map_or_else(
                        || " -> <missing tab>".to_string(),
                        |t| format!(" -> '{}'", t.title),
                    ),
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "  {} <- tab {}{title} [{range}] via '{}'",
                sheet.output, sheet.tab_id, sheet.parser
            );
        }

        match tabs {
            Some(Ok(tabs)) => {
                let all: Vec<String> = tabs
                    .iter()
                    .map(|t| format!("{}={}", t.tab_id, t.title))
                    .collect();
                let _ = writeln!(out, "  tabs: {}", all.join(", "));
            }
            Some(Err(error)) => {
                let _ = writeln!(out, "  tabs unavailable: {error}");
            }
            None => {}
        }
    }

    out.trim_end().to_string()
}
