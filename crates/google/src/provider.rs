//! Lazily connected Sheets client.
//!
//! A [`SheetsProvider`] owns the auth settings and hands out one shared
//! [`GoogleSheetsClient`]. The first [`SheetsProvider::get_or_connect`] runs
//! authorization; later calls reuse the connected client until it is
//! invalidated or the auth settings change.

use crate::auth::{AuthConfig, Authorizer, DEFAULT_AUTHORIZE_DEADLINE, TOKEN_URL};
use crate::client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, GoogleSheetsClient, http_client};
use sheetsync_engine::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Connection settings besides credentials
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Sheets API endpoint
    pub base_url: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Upper bound on the authorization handshake
    pub authorize_deadline: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            authorize_deadline: DEFAULT_AUTHORIZE_DEADLINE,
        }
    }
}

#[derive(Debug)]
enum ConnectionState {
    Unconnected,
    Connected(Arc<GoogleSheetsClient>),
}

#[derive(Debug)]
struct Inner {
    auth: AuthConfig,
    state: ConnectionState,
}

/// Owns the connection to the Sheets backend
#[derive(Debug)]
pub struct SheetsProvider {
    settings: ProviderSettings,
    inner: Mutex<Inner>,
}

impl SheetsProvider {
    /// Create an unconnected provider with default settings
    #[must_use]
    pub fn new(auth: AuthConfig) -> Self {
        Self::with_settings(auth, ProviderSettings::default())
    }

    /// Create an unconnected provider
    #[must_use]
    pub fn with_settings(auth: AuthConfig, settings: ProviderSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(Inner {
                auth,
                state: ConnectionState::Unconnected,
            }),
        }
    }

    /// Connection settings
    #[must_use]
    pub const fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Return the connected client, authorizing first when unconnected.
    ///
    /// Concurrent callers wait for the same authorization. A failed
    /// authorization leaves the provider unconnected.
    ///
    /// # Errors
    ///
    /// Returns the authorization error (`Auth`, `AuthCancelled`,
    /// `AuthTimeout`) or `Configuration` for an invalid base URL.
    pub async fn get_or_connect(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<GoogleSheetsClient>> {
        let mut inner = self.inner.lock().await;
        if let ConnectionState::Connected(client) = &inner.state {
            return Ok(Arc::clone(client));
        }

        let http = http_client(self.settings.request_timeout)?;
        let credentials = Authorizer::new(http.clone(), inner.auth.clone())
            .with_token_url(self.settings.token_url.clone())
            .authorize(cancel, self.settings.authorize_deadline)
            .await?;
        let client = Arc::new(
            GoogleSheetsClient::with_http(http, credentials)
                .with_base_url(&self.settings.base_url)?,
        );

        tracing::info!(
            method = inner.auth.method(),
            base_url = %self.settings.base_url,
            "Connected to Sheets backend"
        );
        inner.state = ConnectionState::Connected(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the connected client; the next call reconnects
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, ConnectionState::Connected(_)) {
            tracing::debug!("Dropping Sheets connection");
        }
        inner.state = ConnectionState::Unconnected;
    }

    /// Replace the auth settings and drop any connected client
    pub async fn set_auth(&self, auth: AuthConfig) {
        let mut inner = self.inner.lock().await;
        inner.auth = auth;
        inner.state = ConnectionState::Unconnected;
    }

    /// Whether a client is currently connected
    pub async fn is_connected(&self) -> bool {
        matches!(
            self.inner.lock().await.state,
            ConnectionState::Connected(_)
        )
    }
}
