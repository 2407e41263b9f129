//! Post messages and file attachments to Cisco Webex.
//!
//! `webex_notify` sends a text or markdown message, optionally with file
//! attachments, to a Webex room or person. It backs the `webex-notify` CLI and
//! can be used directly from other Rust programs:
//!
//! ```no_run
//! use webex_notify::{AttachmentSource, WebexClient, WebexConfig};
//!
//! # fn main() -> webex_notify::error::Result<()> {
//! let config = WebexConfig::new("token", "user@example.com")?;
//! let client = WebexClient::new(config)?;
//! client.send(
//!     Some("Nightly build **passed**"),
//!     vec![AttachmentSource::classify("reports/summary.pdf")],
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`attachment`]: Local, remote and in-memory attachment resolution
//! - [`config`]: Configuration with layered precedence (CLI > env > dotenv > defaults)
//! - [`error`]: Semantic error types for the library and CLI
//! - [`webex`]: Request batching, encoding and response decoding

pub mod attachment;
pub mod config;
pub mod error;
pub mod webex;

pub use attachment::{Attachment, AttachmentSource};
pub use config::{MessageFormat, WebexConfig};
pub use error::NotifyError;
pub use webex::{Destination, SendResult, WebexClient};
