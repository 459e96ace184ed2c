//! Google Sheets v4 REST client.

use crate::auth::Credentials;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sheetsync_engine::{Error, MajorDimension, RawTable, Result, SheetsClient, TabMetadata};
use std::time::Duration;
use tracing::debug;

/// Production Sheets API endpoint
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`SheetsClient`] backed by the Google Sheets REST API
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl std::fmt::Debug for GoogleSheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl GoogleSheetsClient {
    /// Create a client against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        Ok(Self::with_http(http_client(timeout)?, credentials))
    }

    /// Create a client reusing an existing HTTP client
    #[must_use]
    pub fn with_http(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
        }
    }

    /// Point the client at a different endpoint (proxies, tests).
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `base_url` is not an absolute URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        parse_base_url(base_url)?;
        self.base_url = base_url.to_string();
        Ok(self)
    }

    /// Endpoint the client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/v4/spreadsheets/{id}/{extra...}` with every segment encoded
    fn spreadsheet_url(&self, spreadsheet_id: &str, extra: &[&str]) -> Result<Url> {
        let mut url = parse_base_url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| {
                Error::configuration(format!("Base URL cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id])
            .extend(extra);
        Ok(url)
    }

    fn authorize(&self, mut url: Url) -> RequestBuilder {
        match &self.credentials {
            Credentials::Anonymous => self.http.get(url),
            Credentials::ApiKey(key) => {
                url.query_pairs_mut().append_pair("key", key.expose_secret());
                self.http.get(url)
            }
            Credentials::Bearer(token) => self.http.get(url).bearer_auth(token.expose_secret()),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, url: Url) -> Result<T> {
        let response = self
            .authorize(url)
            .send()
            .await
            .map_err(|e| Error::backend(operation, e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::backend(operation, Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected response")
                        .to_string()
                },
                |e| e.error.message,
            );
            return Err(Error::backend(operation, Some(status.as_u16()), message));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::backend(
                operation,
                Some(status.as_u16()),
                format!("malformed response: {e}"),
            )
        })
    }
}

#[async_trait]
impl SheetsClient for GoogleSheetsClient {
    async fn tab_metadata(&self, spreadsheet_id: &str) -> Result<Vec<TabMetadata>> {
        let mut url = self.spreadsheet_url(spreadsheet_id, &[])?;
        url.query_pairs_mut()
            .append_pair("includeGridData", "false")
            .append_pair("fields", "sheets.properties(sheetId,title)");

        debug!(spreadsheet_id, "Fetching spreadsheet metadata");
        let response: SpreadsheetResponse = self.get_json("get metadata", url).await?;

        Ok(response
            .sheets
            .into_iter()
            .map(|sheet| TabMetadata::new(sheet.properties.sheet_id, sheet.properties.title))
            .collect())
    }

    async fn range_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        major_dimension: MajorDimension,
    ) -> Result<RawTable> {
        let mut url = self.spreadsheet_url(spreadsheet_id, &["values", range])?;
        url.query_pairs_mut()
            .append_pair("majorDimension", major_dimension.as_str())
            .append_pair("valueRenderOption", "FORMATTED_VALUE")
            .append_pair("dateTimeRenderOption", "SERIAL_NUMBER");

        debug!(spreadsheet_id, range, "Fetching range values");
        let response: ValueRangeResponse = self.get_json("get values", url).await?;
        Ok(RawTable::new(response.values))
    }
}

/// Build the shared HTTP client.
///
/// # Errors
///
/// Returns `Error::Configuration` if the TLS backend fails to initialize.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("sheetsync/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| Error::configuration(format!("Invalid base URL '{base_url}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::configuration(format!(
            "Invalid base URL '{base_url}': not a hierarchical URL"
        )));
    }
    Ok(url)
}
