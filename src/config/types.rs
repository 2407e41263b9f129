//! Configuration data types for webex-notify.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// How message text is interpreted by Webex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// Plain text, sent in the `text` field.
    Text,
    /// Markdown, sent in the `markdown` field.
    #[default]
    Markdown,
}

impl MessageFormat {
    /// Canonical lowercase name, as accepted by `--format` and `WEBEX_FORMAT`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
        }
    }

    /// Request body field that carries message text in this format.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        self.as_str()
    }
}

/// Layered configuration as merged from defaults, dotenv file, environment
/// and command line.
///
/// Every field may still be unset here; [`Settings::into_webex_config`]
/// enforces the required fields and produces a [`WebexConfig`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WEBEX", post_merge_hook)]
pub struct Settings {
    /// Webex access token.
    pub token: Option<String>,

    /// Destination room id or person email.
    pub dst: Option<String>,

    /// Message format.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub format: MessageFormat,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    #[ortho_config(skip_cli)]
    pub timeout: f64,

    /// Disable TLS certificate verification.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub insecure: bool,

    /// Emit diagnostics on standard error.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub verbose: bool,

    /// HTTP proxy URL.
    pub proxy: Option<String>,
}

const fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: None,
            dst: None,
            format: MessageFormat::Markdown,
            timeout: DEFAULT_TIMEOUT_SECS,
            insecure: false,
            verbose: false,
            proxy: None,
        }
    }
}

impl PostMergeHook for Settings {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // Blank strings count as unset at every layer.
        for value in [&mut self.token, &mut self.dst, &mut self.proxy] {
            let trimmed = value
                .take()
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty());
            *value = trimmed;
        }
        Ok(())
    }
}

impl Settings {
    /// Validate the merged settings and build a [`WebexConfig`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` naming every missing required
    /// field, or `ConfigError::InvalidValue` when the timeout is not a
    /// positive number of seconds.
    pub fn into_webex_config(self) -> Result<WebexConfig> {
        let trimmed = |value: Option<String>| {
            value
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
        };
        let (token, dst) = match (trimmed(self.token), trimmed(self.dst)) {
            (Some(token), Some(dst)) => (token, dst),
            (token_value, dst_value) => {
                let mut missing = Vec::new();
                if token_value.is_none() {
                    missing.push("token (--token / WEBEX_TOKEN)");
                }
                if dst_value.is_none() {
                    missing.push("destination (--dst / WEBEX_DST)");
                }
                return Err(ConfigError::MissingRequired {
                    field: missing.join(", "),
                }
                .into());
            }
        };

        let config = WebexConfig::new(token, dst)?
            .with_format(self.format)
            .with_timeout_secs(self.timeout)?
            .with_insecure(self.insecure)
            .with_verbose(self.verbose)
            .with_proxy(self.proxy);
        Ok(config)
    }
}

/// Validated client configuration.
///
/// `token` and `destination` are guaranteed non-empty. The token is redacted
/// from the `Debug` representation.
#[derive(Clone, PartialEq, Eq)]
pub struct WebexConfig {
    token: String,
    destination: String,
    format: MessageFormat,
    timeout: Duration,
    insecure: bool,
    verbose: bool,
    proxy: Option<String>,
}

impl WebexConfig {
    /// Create a configuration with default format, timeout and transport options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` if `token` or `destination`
    /// is empty.
    pub fn new(token: impl Into<String>, destination: impl Into<String>) -> Result<Self> {
        let token_value = token.into();
        let destination_value = destination.into();
        let mut missing = Vec::new();
        if token_value.trim().is_empty() {
            missing.push("token");
        }
        if destination_value.trim().is_empty() {
            missing.push("destination");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: missing.join(", "),
            }
            .into());
        }

        Ok(Self {
            token: token_value,
            destination: destination_value,
            format: MessageFormat::default(),
            timeout: Duration::from_secs(10),
            insecure: false,
            verbose: false,
            proxy: None,
        })
    }

    /// Set the message format.
    #[must_use]
    pub const fn with_format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` unless `seconds` is a finite,
    /// positive number.
    pub fn with_timeout_secs(mut self, seconds: f64) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(seconds)
            .ok()
            .filter(|duration| !duration.is_zero())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: String::from("timeout"),
                reason: format!("expected a positive number of seconds, got {seconds}"),
            })?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Enable or disable TLS certificate verification bypass.
    #[must_use]
    pub const fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Enable or disable verbose diagnostics.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Route requests through the given proxy URL.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|url| !url.trim().is_empty());
        self
    }

    /// The bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The raw destination string.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The message format.
    #[must_use]
    pub const fn format(&self) -> MessageFormat {
        self.format
    }

    /// The per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether TLS certificate verification is disabled.
    #[must_use]
    pub const fn insecure(&self) -> bool {
        self.insecure
    }

    /// Whether verbose diagnostics are enabled.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// The proxy URL, if any.
    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}

impl fmt::Debug for WebexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebexConfig")
            .field("token", &"<redacted>")
            .field("destination", &self.destination)
            .field("format", &self.format)
            .field("timeout", &self.timeout)
            .field("insecure", &self.insecure)
            .field("verbose", &self.verbose)
            .field("proxy", &self.proxy)
            .finish()
    }
}
