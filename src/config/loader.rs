//! Configuration loading with layered precedence.
//!
//! Layers, lowest to highest: application defaults, a dotenv file, process
//! environment variables, command-line arguments. Each source is turned into
//! a JSON layer and pushed onto an `ortho_config` `MergeComposer`; the merged
//! result is deserialised into [`Settings`] and validated into
//! [`WebexConfig`].
//!
//! # Value handling
//!
//! Empty and whitespace-only strings never set a value, at any layer.
//! Boolean variables accept `1/true/yes/on` and `0/false/no/off`
//! (case-insensitive); any other value is ignored so that a lower layer or
//! the default applies. An unparseable `WEBEX_TIMEOUT` or `WEBEX_FORMAT` is an
//! error naming the variable and the source it came from.
//!
//! Layers are built from the highest precedence down. A field already set by
//! a higher layer is skipped when reading the layers beneath it, so a value
//! that would lose the merge is never parsed and cannot fail the load.

use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use clap::ValueEnum;
use mockable::{DefaultEnv, Env};
use ortho_config::MergeComposer;
use ortho_config::serde_json::{self, Map, Number, Value};
use tracing::debug;

use crate::config::{Cli, MessageFormat, Settings, WebexConfig};
use crate::error::{ConfigError, NotifyError, Result};

/// Dotenv file read from the working directory when `--env-file` is absent.
const DEFAULT_ENV_FILE: &str = ".env";

/// The type of value a setting holds.
#[derive(Clone, Copy)]
enum ValueKind {
    /// Free-form string.
    String,
    /// Boolean token; unrecognised tokens fall through.
    Bool,
    /// Positive number of seconds.
    Seconds,
    /// `text` or `markdown`.
    Format,
}

/// Mapping between an environment variable and a [`Settings`] field.
struct SettingSpec {
    env_var: &'static str,
    field: &'static str,
    kind: ValueKind,
}

/// Every variable understood in the environment and in dotenv files.
const SETTING_SPECS: &[SettingSpec] = &[
    SettingSpec {
        env_var: "WEBEX_TOKEN",
        field: "token",
        kind: ValueKind::String,
    },
    SettingSpec {
        env_var: "WEBEX_DST",
        field: "dst",
        kind: ValueKind::String,
    },
    SettingSpec {
        env_var: "WEBEX_FORMAT",
        field: "format",
        kind: ValueKind::Format,
    },
    SettingSpec {
        env_var: "WEBEX_TIMEOUT",
        field: "timeout",
        kind: ValueKind::Seconds,
    },
    SettingSpec {
        env_var: "WEBEX_INSECURE",
        field: "insecure",
        kind: ValueKind::Bool,
    },
    SettingSpec {
        env_var: "WEBEX_VERBOSE",
        field: "verbose",
        kind: ValueKind::Bool,
    },
    SettingSpec {
        env_var: "WEBEX_PROXY",
        field: "proxy",
        kind: ValueKind::String,
    },
];

/// Returns the list of environment variable names recognised by the loader.
///
/// Tests use this to clear every `WEBEX_*` variable before running.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    SETTING_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Parse a boolean token.
///
/// Returns `None` for anything outside the recognised truthy and falsy sets.
#[must_use]
pub fn parse_bool_token(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid_value(spec: &SettingSpec, origin: &str, reason: &str) -> NotifyError {
    ConfigError::InvalidValue {
        field: spec.env_var.to_owned(),
        reason: format!("{reason} (from {origin})"),
    }
    .into()
}

/// Convert a raw string into the JSON value for `spec`, if it sets one.
fn typed_value(spec: &SettingSpec, raw: &str, origin: &str) -> Result<Option<Value>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match spec.kind {
        ValueKind::String => Ok(Some(Value::String(value.to_owned()))),
        ValueKind::Bool => {
            let parsed = parse_bool_token(value);
            if parsed.is_none() {
                debug!(
                    variable = spec.env_var,
                    origin, "ignoring unrecognised boolean value"
                );
            }
            Ok(parsed.map(Value::Bool))
        }
        ValueKind::Seconds => value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|seconds| Some(Value::Number(seconds)))
            .ok_or_else(|| {
                invalid_value(
                    spec,
                    origin,
                    &format!("expected a number of seconds, got '{value}'"),
                )
            }),
        ValueKind::Format => <MessageFormat as ValueEnum>::from_str(value, true)
            .map(|format| Some(Value::String(format.as_str().to_owned())))
            .map_err(|_| {
                invalid_value(
                    spec,
                    origin,
                    &format!("expected 'text' or 'markdown', got '{value}'"),
                )
            }),
    }
}

/// Build a layer by looking up every known variable through `lookup`.
///
/// Fields named in `shadowed` are left out without being read.
fn layer_from_lookup<F>(origin: &str, shadowed: &HashSet<String>, lookup: F) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    let mut root = Map::new();
    for spec in SETTING_SPECS {
        if shadowed.contains(spec.field) {
            continue;
        }
        let Some(raw) = lookup(spec.env_var) else {
            continue;
        };
        if let Some(value) = typed_value(spec, &raw, origin)? {
            root.insert(spec.field.to_owned(), value);
        }
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Collect `WEBEX_*` variables from the process environment into a layer.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for an unparseable timeout or format.
pub fn collect_env_vars<E: Env>(env: &E) -> Result<Value> {
    env_layer(env, &HashSet::new())
}

fn env_layer<E: Env>(env: &E, shadowed: &HashSet<String>) -> Result<Value> {
    layer_from_lookup("environment", shadowed, |name| env.string(name))
}

/// Read a dotenv file into a layer.
///
/// The file is read through `cap_std::fs_utf8` by opening its parent
/// directory with ambient authority.
///
/// # Errors
///
/// Returns `ConfigError::ParseError` when the file cannot be read or is not
/// valid dotenv syntax, and `ConfigError::InvalidValue` for an unparseable
/// timeout or format.
pub fn read_env_file(path: &Utf8Path) -> Result<Value> {
    env_file_layer(path, &HashSet::new())
}

fn env_file_layer(path: &Utf8Path, shadowed: &HashSet<String>) -> Result<Value> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;
    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let mut entries = HashMap::new();
    for item in dotenvy::from_read_iter(content.as_bytes()) {
        let (key, value) = item.map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;
        entries.insert(key, value);
    }

    layer_from_lookup(path.as_str(), shadowed, |name| entries.get(name).cloned())
}

/// Add the fields set by `layer` to `shadowed`.
fn record_fields(layer: &Value, shadowed: &mut HashSet<String>) {
    if let Some(fields) = layer.as_object() {
        shadowed.extend(fields.keys().cloned());
    }
}

/// Pick the dotenv file to read, if any.
fn resolve_env_file(cli: &Cli) -> Result<Option<Utf8PathBuf>> {
    match &cli.env_file {
        Some(path) if path.is_file() => Ok(Some(path.clone())),
        Some(path) => Err(ConfigError::FileNotFound { path: path.clone() }.into()),
        None => Ok(Some(Utf8PathBuf::from(DEFAULT_ENV_FILE)).filter(|path| path.is_file())),
    }
}

/// Build a JSON value containing CLI overrides.
fn build_cli_overrides(cli: &Cli) -> Result<Value> {
    let mut overrides = Map::new();

    let strings = [
        ("token", cli.token.as_deref()),
        ("dst", cli.dst.as_deref()),
        ("proxy", cli.proxy.as_deref()),
    ];
    for (field, value) in strings {
        if let Some(text) = value.map(str::trim).filter(|text| !text.is_empty()) {
            overrides.insert(field.to_owned(), Value::String(text.to_owned()));
        }
    }

    if let Some(format) = cli.format {
        overrides.insert(
            "format".to_owned(),
            Value::String(format.as_str().to_owned()),
        );
    }

    if let Some(seconds) = cli.timeout {
        let number = Number::from_f64(seconds).ok_or_else(|| ConfigError::InvalidValue {
            field: String::from("--timeout"),
            reason: format!("expected a finite number of seconds, got {seconds}"),
        })?;
        overrides.insert("timeout".to_owned(), Value::Number(number));
    }

    if cli.insecure {
        overrides.insert("insecure".to_owned(), Value::Bool(true));
    }
    if cli.verbose {
        overrides.insert("verbose".to_owned(), Value::Bool(true));
    }

    if overrides.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(overrides))
    }
}

/// Merge every layer into [`Settings`] without validating required fields.
///
/// # Errors
///
/// Returns `ConfigError` when the dotenv file is missing or malformed, a
/// typed value cannot be parsed, or the layers cannot be merged.
pub fn load_settings_with_env<E: Env>(cli: &Cli, env: &E) -> Result<Settings> {
    let mut composer = MergeComposer::new();

    // Layer 1: defaults.
    let defaults =
        serde_json::to_value(Settings::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    // Read from the top down; each layer skips fields set above it.
    let mut shadowed = HashSet::new();
    let cli_overrides = build_cli_overrides(cli)?;
    record_fields(&cli_overrides, &mut shadowed);
    let env_values = env_layer(env, &shadowed)?;
    record_fields(&env_values, &mut shadowed);
    let file_layer = resolve_env_file(cli)?
        .map(|path| env_file_layer(&path, &shadowed).map(|values| (path, values)))
        .transpose()?;

    // Layer 2: dotenv file.
    if let Some((path, file_values)) = file_layer.filter(|(_, values)| !values.is_null()) {
        debug!(path = %path, "loaded dotenv file");
        composer.push_file(file_values, Some(path));
    }

    // Layer 3: environment variables.
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    // Layer 4: CLI overrides.
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let settings =
        Settings::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    Ok(settings)
}

/// Resolve the effective [`WebexConfig`] using an explicit environment provider.
///
/// # Errors
///
/// Returns `ConfigError` when any layer is invalid or when the token or
/// destination is still missing after all layers are merged.
pub fn load_config_with_env<E: Env>(cli: &Cli, env: &E) -> Result<WebexConfig> {
    load_settings_with_env(cli, env)?.into_webex_config()
}

/// Resolve the effective [`WebexConfig`] from the CLI, the process
/// environment and the dotenv file.
///
/// # Errors
///
/// See [`load_config_with_env`].
pub fn load_config(cli: &Cli) -> Result<WebexConfig> {
    load_config_with_env(cli, &DefaultEnv::new())
}
