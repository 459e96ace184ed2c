//! `sheetsync authorize`: store a refresh token and check that credentials work.

use super::CommandOutput;
use crate::cli::CliError;
use crate::project::Project;
use sheetsync_google::{AuthConfig, Authorizer, StoredToken, http_client};
use std::fmt::Write as _;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Store `refresh_token` (OAuth only), then run the authorization handshake.
///
/// # Errors
///
/// Returns `CliError::Config` when a refresh token is given for a non-OAuth
/// method, and `CliError::Auth` when the handshake fails, is cancelled or
/// times out.
#[tracing::instrument(name = "authorize", skip_all, fields(method = project.auth.method()))]
pub async fn execute_authorize(
    project: &Project,
    refresh_token: Option<&str>,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<CommandOutput, CliError> {
    let token_file = project.auth.token_file();

    if let Some(refresh_token) = refresh_token {
        if !matches!(project.auth, AuthConfig::OAuth { .. }) {
            return Err(CliError::config_with_help(
                format!(
                    "--refresh-token requires OAuth, but the manifest uses '{}'",
                    project.auth.method()
                ),
                "Set `method = \"oauth\"` with a client (client_id and client_secret, or credentials_file) in [auth]",
            ));
        }
        let path = token_file.as_deref().ok_or_else(|| {
            CliError::config("No config directory for the token file; set token_file in [auth]")
        })?;
        StoredToken::new(refresh_token).save(path).await?;
        tracing::info!(token_file = %path.display(), "Stored refresh token");
    }

    let settings = project.provider_settings();
    let http = http_client(settings.request_timeout)?;
    Authorizer::new(http, project.auth.clone())
        .with_token_url(settings.token_url)
        .authorize(cancel, deadline)
        .await?;

    let mut text = format!("Authorized using {}", project.auth.method());
    if let Some(path) = token_file {
        let _ = write!(text, " (token file: {})", path.display());
    }
    Ok(CommandOutput::ok(text))
}
