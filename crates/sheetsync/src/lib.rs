//! sheetsync - sync Google Sheets tabs into JSON config files
//!
//! The binary is a thin shell over this library: [`cli`] defines arguments
//! and exit codes, [`project`] loads the manifest, and [`commands`] runs the
//! selected subcommand and returns its output.
//!
//! ```ignore
//! let cli = sheetsync::cli::parse();
//! let output = sheetsync::commands::execute(&cli, &CancellationToken::new()).await?;
//! ```

/// CLI argument parsing, error categories and exit codes.
pub mod cli;
/// Command implementations (pull, list, open, authorize).
pub mod commands;
/// Manifest loading and provider construction.
pub mod project;
/// Tracing subscriber setup and the command span.
pub mod tracing;
