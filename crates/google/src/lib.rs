//! Google Sheets backend for sheetsync.
//!
//! - [`GoogleSheetsClient`]: the engine's [`sheetsync_engine::SheetsClient`]
//!   over the Sheets v4 REST API
//! - [`AuthConfig`] / [`Authorizer`]: API key or OAuth refresh-token
//!   credentials, acquired under a cancellation token and a deadline
//! - [`SheetsProvider`]: connects lazily and keeps one client per auth setting

pub mod auth;
mod client;
mod provider;

pub use auth::{AuthConfig, Authorizer, Credentials, StoredToken};
pub use client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, GoogleSheetsClient, http_client};
pub use provider::{ProviderSettings, SheetsProvider};
