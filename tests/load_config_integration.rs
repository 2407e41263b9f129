//! Integration tests for the `load_config()` public API.
//!
//! These tests validate the end-to-end behaviour of `load_config()` from the
//! `webex_notify::config` module, from CLI argument parsing through the
//! process environment and dotenv file to the final configuration.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use serial_test::serial;
use tempfile::NamedTempFile;
use webex_notify::MessageFormat;
use webex_notify::config::{Cli, env_var_names, load_config};
use webex_notify::error::{ConfigError, NotifyError};

/// Clears all `WEBEX_*` environment variables to ensure test isolation.
fn clear_webex_env() {
    for var in env_var_names() {
        // SAFETY: Tests are run serially via `#[serial]` attribute,
        // preventing concurrent access to environment variables.
        unsafe {
            std::env::remove_var(var);
        }
    }
}

/// Sets an environment variable for the current test.
fn set_env(name: &str, value: &str) {
    // SAFETY: Tests are run serially via `#[serial]` attribute,
    // preventing concurrent access to environment variables.
    unsafe {
        std::env::set_var(name, value);
    }
}

/// Helper: Creates a temporary dotenv file with the given content.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written to.
fn temp_env_file(content: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

/// Helper: Parses CLI arguments, pointing `--env-file` at `file`.
fn cli_with_env_file(file: &NamedTempFile, args: &[&str]) -> Cli {
    let path = file
        .path()
        .to_str()
        .expect("temp file path should be valid UTF-8");
    let mut argv = vec!["webex-notify", "--env-file", path];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("arguments should parse")
}

#[test]
#[serial]
fn load_config_reads_dotenv_file() {
    clear_webex_env();
    let env_file = temp_env_file(
        "WEBEX_TOKEN=file-token\nWEBEX_DST=file-room\nWEBEX_FORMAT=text\nWEBEX_TIMEOUT=2.5\n",
    )
    .expect("failed to create temp env file");

    let config = load_config(&cli_with_env_file(&env_file, &[])).expect("config should load");

    assert_eq!(config.token(), "file-token");
    assert_eq!(config.destination(), "file-room");
    assert_eq!(config.format(), MessageFormat::Text);
    assert_eq!(config.timeout(), Duration::from_millis(2500));
    assert!(!config.insecure());
}

#[test]
#[serial]
fn load_config_environment_overrides_dotenv_file() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=file-token\nWEBEX_DST=file-room\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_DST", "env@example.com");

    let config = load_config(&cli_with_env_file(&env_file, &[])).expect("config should load");

    assert_eq!(config.token(), "file-token");
    assert_eq!(config.destination(), "env@example.com");
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_cli_overrides_environment_and_dotenv_file() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=file-token\nWEBEX_DST=file-room\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_TOKEN", "env-token");
    set_env("WEBEX_FORMAT", "text");

    let cli = cli_with_env_file(
        &env_file,
        &["--token", "cli-token", "--format", "markdown", "--verbose"],
    );
    let config = load_config(&cli).expect("config should load");

    assert_eq!(config.token(), "cli-token");
    assert_eq!(config.destination(), "file-room");
    assert_eq!(config.format(), MessageFormat::Markdown);
    assert!(config.verbose());
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_empty_environment_value_falls_through() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=file-token\nWEBEX_DST=file-room\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_TOKEN", "");

    let config = load_config(&cli_with_env_file(&env_file, &[])).expect("config should load");

    assert_eq!(config.token(), "file-token");
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_whitespace_environment_value_falls_through() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=file-token\nWEBEX_DST=file-room\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_TOKEN", " ");

    let config = load_config(&cli_with_env_file(&env_file, &[])).expect("config should load");

    assert_eq!(config.token(), "file-token");
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_environment_format_hides_invalid_dotenv_format() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=t\nWEBEX_DST=d\nWEBEX_FORMAT=html\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_FORMAT", "text");

    let config = load_config(&cli_with_env_file(&env_file, &[])).expect("config should load");

    assert_eq!(config.format(), MessageFormat::Text);
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_cli_timeout_hides_invalid_environment_timeout() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=t\nWEBEX_DST=d\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_TIMEOUT", "soon");

    let config = load_config(&cli_with_env_file(&env_file, &["--timeout", "5"]))
        .expect("config should load");

    assert_eq!(config.timeout(), Duration::from_secs(5));
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_unrecognised_boolean_falls_through_to_dotenv_file() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=t\nWEBEX_DST=d\nWEBEX_INSECURE=yes\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_INSECURE", "perhaps");

    let config = load_config(&cli_with_env_file(&env_file, &[])).expect("config should load");

    assert!(config.insecure());
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_rejects_invalid_timeout() {
    clear_webex_env();
    let env_file = temp_env_file("WEBEX_TOKEN=t\nWEBEX_DST=d\n")
        .expect("failed to create temp env file");
    set_env("WEBEX_TIMEOUT", "-3");

    let result = load_config(&cli_with_env_file(&env_file, &[]));

    assert!(matches!(
        result,
        Err(NotifyError::Config(ConfigError::InvalidValue { .. }))
    ));
    clear_webex_env();
}

#[test]
#[serial]
fn load_config_reports_missing_token() {
    clear_webex_env();
    let env_file =
        temp_env_file("WEBEX_DST=room-only\n").expect("failed to create temp env file");

    let result = load_config(&cli_with_env_file(&env_file, &[]));

    let Err(NotifyError::Config(ConfigError::MissingRequired { field })) = result else {
        panic!("expected a missing-required error");
    };
    assert!(field.contains("token"));
    assert!(!field.contains("destination"));
}

#[test]
#[serial]
fn load_config_rejects_missing_explicit_env_file() {
    clear_webex_env();
    let cli = Cli::try_parse_from([
        "webex-notify",
        "--env-file",
        "/definitely/not/here/.env",
        "--token",
        "t",
        "--dst",
        "d",
    ])
    .expect("arguments should parse");

    let result = load_config(&cli);

    assert!(matches!(
        result,
        Err(NotifyError::Config(ConfigError::FileNotFound { .. }))
    ));
}
