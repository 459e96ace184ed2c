//! Credentials for the Sheets API.
//!
//! The `[auth]` table of the manifest selects one of three methods:
//!
//! ```toml
//! [auth]
//! method = "api-key"              # public or link-shared spreadsheets
//! key_env = "SHEETSYNC_API_KEY"
//!
//! [auth]
//! method = "oauth"                # private spreadsheets
//! client_id = "123.apps.googleusercontent.com"
//! client_secret = "..."
//! token_file = "~/.config/sheetsync/token.json"
//!
//! [auth]
//! method = "oauth"
//! credentials_file = "client_secret.json"   # downloaded from the Cloud console
//! ```
//!
//! Without an `[auth]` table no credentials are configured and connecting
//! fails with an authorization error.
//!
//! OAuth uses a stored refresh token. [`Authorizer::authorize`] exchanges it
//! for an access token (refreshing only when the stored one is about to
//! expire) and writes the result back to the token file.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use sheetsync_engine::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Google's OAuth 2.0 token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Environment variable read for the API key when the manifest names none
pub const DEFAULT_API_KEY_ENV: &str = "SHEETSYNC_API_KEY";

/// How long [`Authorizer::authorize`] may run by default
pub const DEFAULT_AUTHORIZE_DEADLINE: Duration = Duration::from_secs(60);

/// Stored access tokens this close to expiry are refreshed
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Authentication method from the manifest's `[auth]` table
#[derive(Clone, Default, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum AuthConfig {
    /// No credentials configured; authorization fails
    #[default]
    None,

    /// API key sent as the `key` query parameter
    ApiKey {
        /// Inline key
        #[serde(default, deserialize_with = "deserialize_optional_secret")]
        key: Option<SecretString>,
        /// Environment variable holding the key
        #[serde(default)]
        key_env: Option<String>,
    },

    /// OAuth client with a stored refresh token
    #[serde(rename = "oauth")]
    OAuth {
        /// OAuth client id
        #[serde(default)]
        client_id: Option<String>,
        /// OAuth client secret
        #[serde(default, deserialize_with = "deserialize_optional_secret")]
        client_secret: Option<SecretString>,
        /// Client secrets JSON downloaded from the Google Cloud console,
        /// used when `client_id`/`client_secret` are not set inline
        #[serde(default)]
        credentials_file: Option<PathBuf>,
        /// Token file; defaults to `<config dir>/sheetsync/token.json`
        #[serde(default)]
        token_file: Option<PathBuf>,
    },
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ApiKey { key, key_env } => f
                .debug_struct("ApiKey")
                .field("key", &key.as_ref().map(|_| "[REDACTED]"))
                .field("key_env", key_env)
                .finish(),
            Self::OAuth {
                client_id,
                client_secret,
                credentials_file,
                token_file,
            } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &client_secret.as_ref().map(|_| "[REDACTED]"))
                .field("credentials_file", credentials_file)
                .field("token_file", token_file)
                .finish(),
        }
    }
}

fn deserialize_optional_secret<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|value| value.map(SecretString::from))
}

impl AuthConfig {
    /// Short name of the method, as written in the manifest
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey { .. } => "api-key",
            Self::OAuth { .. } => "oauth",
        }
    }

    /// Token file used by the OAuth method, with the default location applied
    #[must_use]
    pub fn token_file(&self) -> Option<PathBuf> {
        match self {
            Self::OAuth {
                token_file: Some(path),
                ..
            } => Some(path.clone()),
            Self::OAuth {
                token_file: None, ..
            } => default_token_file(),
            _ => None,
        }
    }

    /// Resolve relative `credentials_file` and `token_file` paths against `base`
    #[must_use]
    pub fn relative_to(self, base: &Path) -> Self {
        match self {
            Self::OAuth {
                client_id,
                client_secret,
                credentials_file,
                token_file,
            } => Self::OAuth {
                client_id,
                client_secret,
                credentials_file: credentials_file.map(|p| base.join(p)),
                token_file: token_file.map(|p| base.join(p)),
            },
            other => other,
        }
    }
}

/// `<config dir>/sheetsync/token.json`
#[must_use]
pub fn default_token_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sheetsync").join("token.json"))
}

/// Resolved credentials attached to every Sheets request
#[derive(Clone, Default)]
pub enum Credentials {
    /// No credentials
    #[default]
    Anonymous,
    /// `key` query parameter
    ApiKey(SecretString),
    /// `Authorization: Bearer` header
    Bearer(SecretString),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Self::Bearer(_) => f.write_str("Bearer([REDACTED])"),
        }
    }
}

/// Contents of the OAuth token file
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Last access token, if one was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// When `access_token` stops working
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl StoredToken {
    /// A token holding only a refresh token
    #[must_use]
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: None,
            refresh_token: refresh_token.into(),
            expires_at: None,
        }
    }

    /// The access token, if it is still valid at `now` with a safety margin
    #[must_use]
    pub fn fresh_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let expires_at = self.expires_at?;
        if expires_at > now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) {
            self.access_token.as_deref()
        } else {
            None
        }
    }

    /// Read a token file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the file is missing or malformed.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::auth(format!(
                    "No stored refresh token at {}; run `sheetsync authorize --refresh-token <TOKEN>` first",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(Error::auth(format!(
                    "Failed to read token file {}: {e}",
                    path.display()
                )));
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            Error::auth(format!("Malformed token file {}: {e}", path.display()))
        })
    }

    /// Write the token file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::write_io(e, parent, "create directory"))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::write(path, format!("serialize token: {e}")))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| Error::write_io(e, path, "write"))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Turns an [`AuthConfig`] into request [`Credentials`]
#[derive(Debug, Clone)]
pub struct Authorizer {
    http: reqwest::Client,
    config: AuthConfig,
    token_url: String,
}

impl Authorizer {
    /// Create an authorizer using Google's token endpoint
    #[must_use]
    pub fn new(http: reqwest::Client, config: AuthConfig) -> Self {
        Self {
            http,
            config,
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Use a different token endpoint
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Acquire credentials, giving up when `cancel` fires or `deadline` passes.
    ///
    /// Cancellation wins over a result that becomes ready at the same time.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthCancelled`, `Error::AuthTimeout`, or `Error::Auth`
    /// when the credentials are missing or rejected.
    #[tracing::instrument(skip_all, fields(method = self.config.method()))]
    pub async fn authorize(
        &self,
        cancel: &CancellationToken,
        deadline: Duration,
    ) -> Result<Credentials> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::warn!("Authorization cancelled");
                Err(Error::AuthCancelled)
            }
            outcome = tokio::time::timeout(deadline, self.acquire()) => match outcome {
                Ok(credentials) => credentials,
                Err(_) => {
                    tracing::warn!(deadline_secs = deadline.as_secs(), "Authorization timed out");
                    Err(Error::AuthTimeout {
                        seconds: deadline.as_secs(),
                    })
                }
            },
        }
    }

    async fn acquire(&self) -> Result<Credentials> {
        match &self.config {
            AuthConfig::None => Err(Error::auth(
                "No connection credentials: configure an API key or OAuth client in [auth]",
            )),
            AuthConfig::ApiKey { key, key_env } => {
                resolve_api_key(key.as_ref(), key_env.as_deref()).map(Credentials::ApiKey)
            }
            AuthConfig::OAuth {
                client_id,
                client_secret,
                credentials_file,
                ..
            } => {
                let (client_id, client_secret) = resolve_oauth_client(
                    client_id.as_deref(),
                    client_secret.as_ref(),
                    credentials_file.as_deref(),
                )
                .await?;
                let path = self
                    .config
                    .token_file()
                    .ok_or_else(|| Error::auth("No config directory for the token file"))?;
                self.oauth_access_token(&client_id, &client_secret, &path)
                    .await
                    .map(Credentials::Bearer)
            }
        }
    }

    async fn oauth_access_token(
        &self,
        client_id: &str,
        client_secret: &SecretString,
        token_file: &Path,
    ) -> Result<SecretString> {
        let stored = StoredToken::load(token_file).await?;
        if let Some(access_token) = stored.fresh_access_token(Utc::now()) {
            tracing::debug!(token_file = %token_file.display(), "Using stored access token");
            return Ok(SecretString::from(access_token.to_string()));
        }

        let refreshed = self
            .refresh(client_id, client_secret, &stored.refresh_token)
            .await?;
        refreshed.save(token_file).await?;
        tracing::info!(token_file = %token_file.display(), "Refreshed OAuth access token");

        refreshed
            .access_token
            .map(SecretString::from)
            .ok_or_else(|| Error::auth("Token endpoint returned no access token"))
    }

    async fn refresh(
        &self,
        client_id: &str,
        client_secret: &SecretString,
        refresh_token: &str,
    ) -> Result<StoredToken> {
        tracing::debug!(token_url = %self.token_url, "Exchanging refresh token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret.expose_secret()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::auth(format!("Failed to read token response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body).map_or_else(
                |_| format!("HTTP {status}"),
                |e| match e.error_description {
                    Some(description) => format!("{}: {description}", e.error),
                    None => e.error,
                },
            );
            return Err(Error::auth(format!("Token refresh rejected: {detail}")));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::auth(format!("Malformed token response: {e}")))?;
        Ok(StoredToken {
            access_token: Some(token.access_token),
            refresh_token: token
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            expires_at: Some(Utc::now() + ChronoDuration::seconds(token.expires_in)),
        })
    }
}

/// Pick the inline key, else the named (or default) environment variable.
fn resolve_api_key(key: Option<&SecretString>, key_env: Option<&str>) -> Result<SecretString> {
    if let Some(key) = key.filter(|k| !k.expose_secret().is_empty()) {
        return Ok(key.clone());
    }

    let var = key_env.unwrap_or(DEFAULT_API_KEY_ENV);
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
        _ => Err(Error::auth(format!(
            "API key not configured: set `key` in [auth] or the {var} environment variable"
        ))),
    }
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
}

/// Inline client id and secret, else the `installed` (or `web`) client of a
/// downloaded client secrets file.
async fn resolve_oauth_client(
    client_id: Option<&str>,
    client_secret: Option<&SecretString>,
    credentials_file: Option<&Path>,
) -> Result<(String, SecretString)> {
    if let (Some(id), Some(secret)) = (client_id.filter(|id| !id.is_empty()), client_secret) {
        return Ok((id.to_string(), secret.clone()));
    }

    let Some(path) = credentials_file else {
        return Err(Error::auth(
            "OAuth client not configured: set client_id and client_secret, or credentials_file, in [auth]",
        ));
    };
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::auth(format!(
            "Failed to read credentials file {}: {e}",
            path.display()
        ))
    })?;
    let file: ClientSecretsFile = serde_json::from_str(&content).map_err(|e| {
        Error::auth(format!(
            "Malformed credentials file {}: {e}",
            path.display()
        ))
    })?;
    let client = file.installed.or(file.web).ok_or_else(|| {
        Error::auth(format!(
            "Credentials file {} has no \"installed\" or \"web\" client",
            path.display()
        ))
    })?;

    tracing::debug!(credentials_file = %path.display(), "Loaded OAuth client from file");
    Ok((client.client_id, SecretString::from(client.client_secret)))
}
