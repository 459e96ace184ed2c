//! Log setup for the sheetsync CLI.
//!
//! Logs go to stderr so stdout carries only command output. `RUST_LOG` wins
//! over `--level`; either way only the sheetsync crates are enabled by
//! default, keeping reqwest and hyper quiet.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// One short line per event
    Text,
    /// One JSON object per event, with the enclosing spans
    Json,
}

/// Verbosity selected with `--level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Everything, including per-request detail
    Trace,
    /// Cache and connection decisions
    Debug,
    /// One line per written file
    Info,
    /// Failed sheets and interruptions (default)
    Warn,
    /// Failures only
    Error,
}

impl LogLevel {
    /// Filter directive enabling this level for every sheetsync crate
    #[must_use]
    pub fn directive(self) -> String {
        let level = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        ["sheetsync", "sheetsync_engine", "sheetsync_google"]
            .map(|target| format!("{target}={level}"))
            .join(",")
    }
}

static CORRELATION_ID: std::sync::OnceLock<Uuid> = std::sync::OnceLock::new();

/// Id shared by every command span of this process
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` holds an invalid directive.
pub fn init_tracing(format: LogFormat, level: LogLevel) -> miette::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(level.directive()),
    }
    .map_err(|e| miette::miette!("Invalid log filter: {e}"))?;

    let registry = tracing_subscriber::registry().with(filter);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match format {
        LogFormat::Text => registry.with(layer.compact().with_target(false)).init(),
        LogFormat::Json => registry
            .with(layer.json().with_current_span(true).with_span_list(true))
            .init(),
    }

    ::tracing::debug!(
        correlation_id = %correlation_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Logging ready"
    );
    Ok(())
}

/// Span wrapping one command run
#[macro_export]
macro_rules! command_span {
    ($command:expr) => {
        ::tracing::info_span!(
            "command",
            command = %$command,
            correlation_id = %$crate::tracing::correlation_id(),
            start_time = %::chrono::Utc::now().to_rfc3339(),
        )
    };
}
