//! Command implementations.
//!
//! Each command returns its human-readable output; `main` prints it and maps
//! the outcome to an exit code.

mod authorize;
mod list;
mod open;
mod pull;

pub use authorize::execute_authorize;
pub use list::{execute_list, format_manifest};
pub use open::execute_open;
pub use pull::{PullOptions, execute_pull, format_report, pull_with_client};

use crate::cli::{Cli, CliError, Commands};
use crate::project::Project;
use tokio_util::sync::CancellationToken;

/// Text printed on stdout plus whether the command fully succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Output for stdout
    pub text: String,
    /// False when some part of the work failed (exit code 1)
    pub success: bool,
}

impl CommandOutput {
    /// Output of a command that fully succeeded
    #[must_use]
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }
}

/// Load the project and run the selected command.
///
/// # Errors
///
/// Returns a `CliError` when the manifest is invalid, authorization fails,
/// or the command cannot run at all.
pub async fn execute(cli: &Cli, cancel: &CancellationToken) -> Result<CommandOutput, CliError> {
    let project = Project::load(&cli.config)?
        .with_base_url(cli.base_url.clone())
        .with_token_url(cli.token_url.clone());

    match &cli.command {
        Commands::Pull { only, dry_run } => {
            let options = PullOptions {
                only: only.clone(),
                dry_run: *dry_run,
            };
            execute_pull(&project, &options, cancel).await
        }
        Commands::List { remote } => execute_list(&project, *remote, cancel).await,
        Commands::Open {
            spreadsheet,
            no_browser,
        } => execute_open(&project, spreadsheet.as_deref(), !no_browser).await,
        Commands::Authorize {
            refresh_token,
            timeout,
        } => {
            execute_authorize(
                &project,
                refresh_token.as_deref(),
                std::time::Duration::from_secs(*timeout),
                cancel,
            )
            .await
        }
    }
}
