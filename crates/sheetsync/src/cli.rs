//! Command-line definition, error categories and exit codes.

use crate::tracing::{LogFormat, LogLevel};
use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Everything synced
pub const EXIT_OK: i32 = 0;
/// At least one sheet failed to sync
pub const EXIT_SYNC_FAILED: i32 = 1;
/// CLI or configuration error
pub const EXIT_CLI: i32 = 2;
/// Credentials missing, rejected, cancelled or timed out
pub const EXIT_AUTH: i32 = 3;

/// CLI error categories with exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Manifest or argument problem (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(sheetsync::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Authorization problem (exit code 3)
    #[error("{message}")]
    #[diagnostic(code(sheetsync::cli::auth))]
    Auth {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Anything else (exit code 1)
    #[error("{message}")]
    #[diagnostic(code(sheetsync::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an uncategorized error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

/// Map engine errors onto CLI categories.
///
/// - `Configuration` -> Config (exit code 2)
/// - `Auth`, `AuthCancelled`, `AuthTimeout` -> Auth (exit code 3)
/// - everything else -> Other (exit code 1)
impl From<sheetsync_engine::Error> for CliError {
    fn from(err: sheetsync_engine::Error) -> Self {
        let help = err.help().map(|h| h.to_string());
        match err {
            // Avoid "Configuration error: Configuration error:"
            sheetsync_engine::Error::Configuration { message } => Self::Config { message, help },
            err if err.is_auth() => Self::Auth {
                message: err.to_string(),
                help,
            },
            err => Self::Other {
                message: err.to_string(),
                help,
            },
        }
    }
}

/// Map CLI error to its exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Auth { .. } => EXIT_AUTH,
        CliError::Other { .. } => EXIT_SYNC_FAILED,
    }
}

/// Print an error report to stderr
#[allow(clippy::print_stderr)]
pub fn render_error(err: CliError) {
    let report = Report::new(err);
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

/// Sync Google Sheets tabs into JSON config files.
#[derive(Parser, Debug)]
#[command(name = "sheetsync")]
#[command(about = "Sync Google Sheets tabs into JSON config files")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the project manifest.
    #[arg(
        short = 'c',
        long,
        global = true,
        env = "SHEETSYNC_CONFIG",
        default_value = "sheetsync.toml",
        help = "Path to the project manifest (TOML or JSON)"
    )]
    pub config: PathBuf,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "text",
        value_enum
    )]
    pub log_format: LogFormat,

    /// Sheets API endpoint override.
    #[arg(
        long,
        global = true,
        env = "SHEETSYNC_BASE_URL",
        hide = true,
        help = "Sheets API endpoint (proxies and testing)"
    )]
    pub base_url: Option<String>,

    /// OAuth token endpoint override.
    #[arg(
        long,
        global = true,
        env = "SHEETSYNC_TOKEN_URL",
        hide = true,
        help = "OAuth token endpoint (proxies and testing)"
    )]
    pub token_url: Option<String>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch every configured sheet and write its config file.
    #[command(about = "Fetch every configured sheet and write its config file")]
    Pull {
        /// Restrict the run to these spreadsheets (name or id, repeatable).
        #[arg(
            long = "only",
            value_name = "SPREADSHEET",
            action = clap::ArgAction::Append,
            help = "Only sync this spreadsheet (name or id, repeatable)"
        )]
        only: Vec<String>,
        /// Report what would change without writing files.
        #[arg(long, help = "Report what would change without writing files")]
        dry_run: bool,
    },
    /// List configured spreadsheets and sheets.
    #[command(about = "List configured spreadsheets and sheets")]
    List {
        /// Also fetch tab titles from the backend.
        #[arg(long, help = "Also fetch tab titles from the backend")]
        remote: bool,
    },
    /// Open a spreadsheet in the browser.
    #[command(about = "Open a spreadsheet in the browser")]
    Open {
        /// Spreadsheet name or id; the first configured one when omitted.
        #[arg(value_name = "SPREADSHEET")]
        spreadsheet: Option<String>,
        /// Only print the URL.
        #[arg(long)]
        no_browser: bool,
    },
    /// Check credentials, refreshing the stored OAuth token.
    #[command(about = "Check credentials, refreshing the stored OAuth token")]
    Authorize {
        /// Store this refresh token before authorizing (OAuth only).
        #[arg(
            long,
            env = "SHEETSYNC_REFRESH_TOKEN",
            hide_env_values = true,
            help = "Store this refresh token before authorizing (OAuth only)"
        )]
        refresh_token: Option<String>,
        /// Give up after this many seconds.
        #[arg(long, default_value_t = 60, help = "Give up after this many seconds")]
        timeout: u64,
    },
}

impl Commands {
    /// Command name for spans and logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pull { .. } => "pull",
            Self::List { .. } => "list",
            Self::Open { .. } => "open",
            Self::Authorize { .. } => "authorize",
        }
    }
}

/// Parse command-line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
