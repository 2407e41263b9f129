//! Semantic error types for webex-notify.
//!
//! Each failure family gets its own `thiserror` enum so callers can inspect
//! what went wrong, and [`NotifyError`] aggregates them for the public API.
//! The binary converts these into `eyre::Report` at the process boundary and
//! uses [`NotifyError::exit_code`] to pick the exit status.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the file was expected.
        path: Utf8PathBuf,
    },

    /// A configuration file could not be read or parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A required configuration value is missing after all sources were consulted.
    #[error("missing required configuration: {field}")]
    MissingRequired {
        /// The name of the missing field or fields.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library failed to merge the configuration layers.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors caused by the arguments of a send call.
#[derive(Debug, Error)]
pub enum InputError {
    /// Neither message text nor attachments were supplied.
    #[error("either a message or at least one attachment must be provided")]
    NothingToSend,

    /// An attachment resolved to zero bytes.
    #[error("attachment '{filename}' is empty")]
    EmptyAttachment {
        /// The attachment's file name.
        filename: String,
    },

    /// A remote attachment reference uses a scheme other than HTTP(S).
    #[error("unsupported attachment URL scheme '{scheme}' in '{reference}'")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
        /// The full attachment reference.
        reference: String,
    },

    /// A remote attachment reference is not a valid URL.
    #[error("invalid attachment URL '{reference}': {message}")]
    InvalidUrl {
        /// The full attachment reference.
        reference: String,
        /// A description of the parse failure.
        message: String,
    },

    /// An attachment carries a MIME type the HTTP layer rejects.
    #[error("invalid MIME type '{mime_type}' for attachment '{filename}'")]
    InvalidMimeType {
        /// The attachment's file name.
        filename: String,
        /// The rejected MIME type.
        mime_type: String,
    },
}

/// Errors that can occur while reading local attachments.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// The attachment path does not exist or is not a regular file.
    #[error("attachment not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: Utf8PathBuf,
    },

    /// An I/O error occurred while reading the attachment.
    #[error("I/O error at '{path}': {message}")]
    IoError {
        /// The path where the error occurred.
        path: Utf8PathBuf,
        /// A description of the I/O error.
        message: String,
    },
}

/// Errors raised by the HTTP transport.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    ClientBuild {
        /// A description of the failure.
        message: String,
    },

    /// A request could not be sent or its response could not be read.
    #[error("request to {url} failed: {message}")]
    RequestFailed {
        /// The request URL.
        url: String,
        /// A description of the transport failure.
        message: String,
    },

    /// A remote attachment download returned a non-success status.
    #[error("download of {url} failed with status {status}")]
    DownloadFailed {
        /// The attachment URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

/// Errors reported by the Webex API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Webex answered with an HTTP status of 400 or above.
    #[error("Webex API error {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body text.
        body: String,
    },

    /// A success response did not carry a JSON body.
    #[error("failed to parse Webex API response (status {status}) as JSON: {message}")]
    InvalidResponse {
        /// The HTTP status code.
        status: u16,
        /// A description of the decode failure.
        message: String,
    },
}

/// Top-level error type for webex-notify.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The send call was given unusable arguments.
    #[error(transparent)]
    Input(#[from] InputError),

    /// A local attachment could not be read.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// The HTTP transport failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The Webex API rejected a request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl NotifyError {
    /// Process exit code the CLI reports for this error.
    ///
    /// Configuration and argument problems map to `2`; everything that
    /// happens once sending starts (attachments, transport, API) maps to `3`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Input(_) => 2,
            Self::Filesystem(_) | Self::Network(_) | Self::Api(_) => 3,
        }
    }
}

/// A specialised `Result` type for webex-notify operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
