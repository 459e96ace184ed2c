//! Error types for the sync engine

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for sync operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No usable credentials, or the authorization handshake failed
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(sheetsync::auth),
        help("Configure an API key or OAuth client credentials in the [auth] section")
    )]
    Auth {
        /// Description of what went wrong
        message: String,
    },

    /// The authorization handshake was cancelled by the caller
    #[error("Authorization was cancelled")]
    #[diagnostic(code(sheetsync::auth::cancelled))]
    AuthCancelled,

    /// The authorization handshake did not finish before its deadline
    #[error("Authorization timed out after {seconds} seconds")]
    #[diagnostic(
        code(sheetsync::auth::timeout),
        help("Check network connectivity to the token endpoint and try again")
    )]
    AuthTimeout {
        /// Deadline that expired
        seconds: u64,
    },

    /// The tab id does not exist in the spreadsheet's metadata
    #[error("Tab {tab_id} not found in spreadsheet '{spreadsheet_id}'")]
    #[diagnostic(
        code(sheetsync::lookup),
        help("Tab ids are the `gid` value in the sheet URL; check the manifest entry")
    )]
    Lookup {
        /// Spreadsheet that was searched
        spreadsheet_id: String,
        /// Tab id that was requested
        tab_id: i64,
    },

    /// A call to the spreadsheet backend failed
    #[error("Backend request '{operation}' failed{}: {message}", status.map_or(String::new(), |s| format!(" (HTTP {s})")))]
    #[diagnostic(code(sheetsync::backend))]
    Backend {
        /// Operation that was attempted (e.g. "get metadata")
        operation: String,
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Error message from the backend or transport
        message: String,
    },

    /// No parser is registered under the requested tag
    #[error("No parser registered for tag '{tag}' (available: {})", available.join(", "))]
    #[diagnostic(
        code(sheetsync::parser_not_found),
        help("Parser tags are case-sensitive and must match a registered parser exactly")
    )]
    ParserNotFound {
        /// Requested tag
        tag: String,
        /// Tags that are registered
        available: Vec<String>,
    },

    /// A parser could not turn the table into a document
    #[error("Parser '{tag}' failed: {message}")]
    #[diagnostic(code(sheetsync::parse))]
    Parse {
        /// Tag of the failing parser
        tag: String,
        /// Error message from the parser
        message: String,
    },

    /// The output file could not be written
    #[error("Failed to write config '{}': {message}", path.display())]
    #[diagnostic(
        code(sheetsync::write),
        help("Check that the output name is a relative path and the project root is writable")
    )]
    Write {
        /// Destination path
        path: Box<Path>,
        /// Description of what went wrong
        message: String,
        /// Underlying I/O error, if any
        #[source]
        source: Option<std::io::Error>,
    },

    /// The sync manifest is invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(sheetsync::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create an authentication error
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a lookup error
    #[must_use]
    pub fn lookup(spreadsheet_id: impl Into<String>, tab_id: i64) -> Self {
        Self::Lookup {
            spreadsheet_id: spreadsheet_id.into(),
            tab_id,
        }
    }

    /// Create a backend error
    #[must_use]
    pub fn backend(
        operation: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Backend {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Create a write error with an I/O source
    #[must_use]
    pub fn write_io(source: std::io::Error, path: impl AsRef<Path>, operation: &str) -> Self {
        Self::Write {
            path: path.as_ref().into(),
            message: format!("{operation} failed"),
            source: Some(source),
        }
    }

    /// Create a write error without an I/O source
    #[must_use]
    pub fn write(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.as_ref().into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Whether this error prevents any further remote call in the run
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. } | Self::AuthCancelled | Self::AuthTimeout { .. }
        )
    }
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, Error>;
