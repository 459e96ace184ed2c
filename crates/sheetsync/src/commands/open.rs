//! `sheetsync open`: show a spreadsheet in the browser.

use super::CommandOutput;
use crate::cli::CliError;
use crate::project::Project;
use tokio::process::Command;

/// Overrides the program used to open URLs
pub const BROWSER_ENV: &str = "BROWSER";

/// Resolve the spreadsheet and open its browser URL.
///
/// With `launch` unset, or when the browser cannot be started, the URL is
/// only printed.
///
/// # Errors
///
/// Returns `CliError::Config` if the spreadsheet is unknown, no spreadsheet
/// is configured, or it has no sheets to link to. Returns `CliError::Other`
/// when the browser command fails.
pub async fn execute_open(
    project: &Project,
    spreadsheet: Option<&str>,
    launch: bool,
) -> Result<CommandOutput, CliError> {
    let config = match spreadsheet {
        Some(name) => project.manifest.find(name).ok_or_else(|| {
            CliError::config_with_help(
                format!("No spreadsheet named '{name}' in the manifest"),
                format!("Configured spreadsheets: {}", project.names().join(", ")),
            )
        })?,
        None => project
            .manifest
            .spreadsheets
            .first()
            .ok_or_else(|| CliError::config("No spreadsheets configured"))?,
    };

    let url = config.browser_url().ok_or_else(|| {
        CliError::config(format!(
            "Spreadsheet '{}' has no sheets to open",
            config.display_name()
        ))
    })?;

    if !launch {
        return Ok(CommandOutput::ok(url));
    }

    open_in_browser(&url).await?;
    Ok(CommandOutput::ok(format!("Opened {url}")))
}

/// Hand `url` to `$BROWSER` or the platform opener.
async fn open_in_browser(url: &str) -> Result<(), CliError> {
    let mut command = match std::env::var(BROWSER_ENV) {
        Ok(program) if !program.trim().is_empty() => Command::new(program.trim()),
        _ => platform_opener(),
    };
    tracing::debug!(url, command = ?command.as_std().get_program(), "Opening browser");

    let status = command.arg(url).status().await.map_err(|e| CliError::Other {
        message: format!("Failed to start the browser: {e}"),
        help: Some(format!("Open {url} manually")),
    })?;

    if !status.success() {
        return Err(CliError::Other {
            message: format!("Browser command exited with {status}"),
            help: Some(format!("Open {url} manually")),
        });
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn platform_opener() -> Command {
    Command::new("open")
}

#[cfg(target_os = "windows")]
fn platform_opener() -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_opener() -> Command {
    Command::new("xdg-open")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(content: &str) -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sheetsync.toml");
        std::fs::write(&path, content).unwrap();
        let project = Project::load(&path).unwrap();
        (temp, project)
    }

    const MANIFEST: &str = r#"
[[spreadsheets]]
name = "Balance"
id = "1AbC"

[[spreadsheets.sheets]]
output = "Enemies"
tab_id = 12

[[spreadsheets]]
name = "Empty"
id = "2XyZ"
"#;

    #[tokio::test]
    async fn test_open_first_spreadsheet() {
        let (_temp, project) = project(MANIFEST);
        let output = execute_open(&project, None, false).await.unwrap();
        assert_eq!(
            output.text,
            "https://docs.google.com/spreadsheets/d/1AbC/#gid=12"
        );
    }

    #[tokio::test]
    async fn test_open_by_id() {
        let (_temp, project) = project(MANIFEST);
        let output = execute_open(&project, Some("1AbC"), false).await.unwrap();
        assert!(output.text.ends_with("#gid=12"));
    }

    #[tokio::test]
    async fn test_open_without_sheets() {
        let (_temp, project) = project(MANIFEST);
        let err = execute_open(&project, Some("Empty"), true).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Spreadsheet 'Empty' has no sheets to open"
        );
    }

    #[tokio::test]
    async fn test_open_unknown() {
        let (_temp, project) = project(MANIFEST);
        let err = execute_open(&project, Some("Loot"), true).await.unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[tokio::test]
    async fn test_open_empty_manifest() {
        let (_temp, project) = project("root = \".\"\n");
        assert!(execute_open(&project, None, false).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_launches_browser() {
        let (_temp, project) = project(MANIFEST);
        let output = temp_env::async_with_vars([(BROWSER_ENV, Some("true"))], async {
            execute_open(&project, Some("Balance"), true).await
        })
        .await
        .unwrap();
        assert_eq!(
            output.text,
            "Opened https://docs.google.com/spreadsheets/d/1AbC/#gid=12"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_reports_failing_browser() {
        let (_temp, project) = project(MANIFEST);
        let err = temp_env::async_with_vars([(BROWSER_ENV, Some("false"))], async {
            execute_open(&project, None, true).await
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Other { .. }));
        assert!(err.to_string().contains("Browser command exited"));
    }

    #[tokio::test]
    async fn test_open_reports_missing_browser() {
        let (_temp, project) = project(MANIFEST);
        let err = temp_env::async_with_vars(
            [(BROWSER_ENV, Some("sheetsync-no-such-browser"))],
            async { execute_open(&project, None, true).await },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to start the browser"));
    }
}
