//! `webex-notify` application entry point.
//!
//! Sends one message, with any attachments given by `--file`, to a Webex room
//! or person. It uses `eyre` for opaque error handling at the application
//! boundary and maps domain errors onto exit codes:
//!
//! - `0`: success, nothing is written to standard output;
//! - `2`: configuration error or invalid input (clap usage errors also exit 2);
//! - `3`: attachment, transport or Webex API failure;
//! - `4`: anything else.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Dotenv file (`./.env` or the path given by `--env-file`)
//! 3. Environment variables (`WEBEX_*`)
//! 4. Command-line arguments

use std::process::ExitCode;

use clap::Parser;
use eyre::{Report, Result as EyreResult};
use tracing::{Level, debug};
use webex_notify::config::{Cli, load_config};
use webex_notify::{AttachmentSource, NotifyError, WebexClient, WebexConfig};

/// Exit code for failures that are not a [`NotifyError`].
const UNEXPECTED_EXIT_CODE: u8 = 4;

/// Application entry point.
///
/// Loads configuration, installs a stderr diagnostics subscriber for the
/// duration of the send, then maps the outcome onto an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => return report_config_failure(&error),
    };

    let level = if config.verbose() {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    match tracing::subscriber::with_default(subscriber, || run(&cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => report_failure(&report),
    }
}

/// Send the message described by the CLI.
///
/// Keeps semantic errors inside the run loop so the CLI boundary owns
/// conversion to an exit code.
fn run(cli: &Cli, config: WebexConfig) -> EyreResult<()> {
    debug!(config = ?config, "resolved configuration");
    let client = WebexClient::new(config)?;

    let sources = cli
        .files
        .iter()
        .map(String::as_str)
        .map(AttachmentSource::classify)
        .collect();
    let result = client.send(cli.message.as_deref(), sources)?;

    if client.config().verbose() {
        let pretty = serde_json::to_string_pretty(&result)?;
        debug!("Webex response:\n{pretty}");
    }
    Ok(())
}

#[expect(
    clippy::print_stderr,
    reason = "configuration errors are reported before diagnostics are set up"
)]
fn report_config_failure(error: &NotifyError) -> ExitCode {
    eprintln!("Configuration error: {error}");
    ExitCode::from(error.exit_code())
}

#[expect(clippy::print_stderr, reason = "CLI error output is the intended behaviour")]
fn report_failure(report: &Report) -> ExitCode {
    report.downcast_ref::<NotifyError>().map_or_else(
        || {
            eprintln!("Unexpected error: {report:?}");
            ExitCode::from(UNEXPECTED_EXIT_CODE)
        },
        |error| {
            eprintln!("Error: {error}");
            ExitCode::from(error.exit_code())
        },
    )
}
