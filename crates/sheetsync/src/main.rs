//! sheetsync CLI entry point

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

use sheetsync::cli::{
    self, CliError, EXIT_CLI, EXIT_OK, EXIT_SYNC_FAILED, exit_code_for, render_error,
};
use sheetsync::commands;
use sheetsync::tracing::init_tracing;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

fn main() {
    let cli = cli::parse();

    if let Err(e) = init_tracing(cli.log_format, cli.level) {
        eprintln!("Failed to initialize tracing: {e:?}");
        std::process::exit(EXIT_CLI);
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            render_error(CliError::other(format!(
                "Failed to create tokio runtime: {e}"
            )));
            std::process::exit(EXIT_SYNC_FAILED);
        }
    };

    let exit_code = rt.block_on(run(cli));
    std::process::exit(exit_code);
}

async fn run(cli: cli::Cli) -> i32 {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let span = sheetsync::command_span!(cli.command.name());
    let result = commands::execute(&cli, &cancel).instrument(span).await;

    match result {
        Ok(output) => {
            if !output.text.is_empty() {
                println!("{}", output.text);
            }
            if output.success {
                EXIT_OK
            } else {
                EXIT_SYNC_FAILED
            }
        }
        Err(err) => {
            let code = exit_code_for(&err);
            render_error(err);
            code
        }
    }
}
