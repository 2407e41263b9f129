//! Command-line argument definitions for webex-notify.

use camino::Utf8PathBuf;
use clap::Parser;

use super::MessageFormat;

/// Command-line interface for webex-notify.
///
/// Every connection flag overrides the matching `WEBEX_*` environment
/// variable, which in turn overrides the dotenv file.
#[derive(Debug, Parser)]
#[command(name = "webex-notify")]
#[command(
    author,
    version,
    about = "Send a message and optional attachments to Cisco Webex"
)]
pub struct Cli {
    /// Webex access token (overrides `WEBEX_TOKEN`).
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// Destination room id or person email (overrides `WEBEX_DST`).
    #[arg(short = 'd', long)]
    pub dst: Option<String>,

    /// Message format (overrides `WEBEX_FORMAT`).
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<MessageFormat>,

    /// HTTP timeout in seconds (overrides `WEBEX_TIMEOUT`).
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Disable TLS certificate verification (overrides `WEBEX_INSECURE`).
    #[arg(long)]
    pub insecure: bool,

    /// Write diagnostics to standard error (overrides `WEBEX_VERBOSE`).
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// HTTP proxy URL (overrides `WEBEX_PROXY`).
    #[arg(short = 'p', long)]
    pub proxy: Option<String>,

    /// Message body to send.
    #[arg(short = 'm', long)]
    pub message: Option<String>,

    /// Local file path or HTTP(S) URL to attach. May be repeated.
    #[arg(long = "file", value_name = "PATH_OR_URL")]
    pub files: Vec<String>,

    /// Dotenv file to read defaults from (defaults to `./.env` when present).
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<Utf8PathBuf>,
}
