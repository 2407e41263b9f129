//! Webex messages client.
//!
//! [`WebexClient::send`] turns one message and any number of attachments
//! into a batch of `POST /v1/messages` requests:
//!
//! - no attachment: one JSON request carrying the message;
//! - one attachment: one multipart request carrying the message and file;
//! - several attachments: the message rides with the first file and every
//!   further file is posted on its own.
//!
//! Requests are issued strictly in order on one blocking HTTP client. The
//! first failure aborts the batch and is returned to the caller.

mod request;
mod response;

#[cfg(test)]
mod tests;

use reqwest::Proxy;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use crate::attachment::{self, Attachment, AttachmentSource};
use crate::config::WebexConfig;
use crate::error::{ConfigError, InputError, NetworkError, Result};

pub use request::Destination;
pub use response::SendResult;

use request::{JSON_CONTENT_TYPE, OutgoingMessage, json_body, multipart_form, plan_batch};
use response::decode_body;

/// Default Webex messages endpoint.
pub const WEBEX_API_MESSAGES: &str = "https://webexapis.com/v1/messages";

/// Client for the Webex messages API.
///
/// Holds one HTTP client, configured with the timeout, TLS and proxy options
/// of its [`WebexConfig`], and reuses it for every request and attachment
/// download. Use one client per thread.
#[derive(Debug)]
pub struct WebexClient {
    config: WebexConfig,
    endpoint: String,
    http: Client,
}

impl WebexClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the proxy URL is unusable and
    /// `NetworkError::ClientBuild` when the HTTP client cannot be created.
    pub fn new(config: WebexConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure());
        if let Some(proxy_url) = config.proxy() {
            let proxy = Proxy::all(proxy_url).map_err(|error| ConfigError::InvalidValue {
                field: String::from("proxy"),
                reason: error.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|error| NetworkError::ClientBuild {
                message: error.to_string(),
            })?;

        Ok(Self {
            config,
            endpoint: WEBEX_API_MESSAGES.to_owned(),
            http,
        })
    }

    /// Post to `endpoint` instead of the public Webex API.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &WebexConfig {
        &self.config
    }

    /// The endpoint messages are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Download an attachment from an `http` or `https` URL.
    ///
    /// The download uses this client's timeout, TLS and proxy settings but
    /// never sends the Webex token.
    ///
    /// # Errors
    ///
    /// See [`WebexClient::resolve_attachment`].
    pub fn attachment_from_url(&self, url: &str) -> Result<Attachment> {
        attachment::fetch(&self.http, url)
    }

    /// Resolve an attachment source into an in-memory attachment.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError` for unreadable local paths, `InputError`
    /// for unsupported or malformed URLs, and `NetworkError` when a download
    /// fails.
    pub fn resolve_attachment(&self, source: AttachmentSource) -> Result<Attachment> {
        match source {
            AttachmentSource::LocalPath(path) => Attachment::from_path(&path),
            AttachmentSource::RemoteUrl(url) => self.attachment_from_url(&url),
            AttachmentSource::InMemory(resolved) => Ok(resolved),
        }
    }

    /// Send a message, attachments, or both.
    ///
    /// An empty message counts as no message. Every attachment is resolved
    /// before the first request is made.
    ///
    /// # Errors
    ///
    /// Returns `InputError::NothingToSend` when there is neither a message
    /// nor an attachment, `InputError::EmptyAttachment` when an attachment
    /// has no content, any resolution error from
    /// [`WebexClient::resolve_attachment`], `NetworkError::RequestFailed` on
    /// transport failure and `ApiError` when Webex rejects a request or
    /// answers with something other than JSON. The first failing request
    /// aborts the rest of the batch.
    pub fn send(
        &self,
        message: Option<&str>,
        attachments: Vec<AttachmentSource>,
    ) -> Result<SendResult> {
        let text = message.filter(|body| !body.is_empty());
        if text.is_none() && attachments.is_empty() {
            return Err(InputError::NothingToSend.into());
        }

        let resolved = attachments
            .into_iter()
            .map(|source| self.resolve_attachment(source))
            .collect::<Result<Vec<_>>>()?;
        if let Some(empty) = resolved.iter().find(|item| item.is_empty()) {
            return Err(InputError::EmptyAttachment {
                filename: empty.display_name().to_owned(),
            }
            .into());
        }

        let destination = Destination::classify(self.config.destination());
        let batch = plan_batch(text, resolved);
        let total = batch.len();
        let mut responses = Vec::with_capacity(total);
        for outgoing in batch {
            let delivered = responses.len();
            let response = self.post(&destination, outgoing).inspect_err(|_| {
                if total > 1 {
                    warn!(delivered, total, "aborting batch after failed request");
                }
            })?;
            responses.push(response);
        }

        Ok(SendResult::from_responses(responses))
    }

    /// Issue one request and decode its response.
    fn post(&self, destination: &Destination, outgoing: OutgoingMessage) -> Result<Value> {
        let format = self.config.format();
        let message_len = outgoing.text.as_deref().map_or(0, str::len);
        let builder = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.config.token());

        let prepared = if let Some(file) = outgoing.attachment {
            debug!(
                url = %self.endpoint,
                dest = destination.value(),
                file = file.display_name(),
                message_len,
                "POST"
            );
            builder.multipart(multipart_form(destination, format, outgoing.text, file)?)
        } else {
            debug!(
                url = %self.endpoint,
                dest = destination.value(),
                message_len,
                "POST"
            );
            let body = json_body(destination, format, outgoing.text.as_deref());
            builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).json(&body)
        };

        let response = prepared
            .send()
            .map_err(|error| NetworkError::RequestFailed {
                url: self.endpoint.clone(),
                message: error.to_string(),
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| NetworkError::RequestFailed {
                url: self.endpoint.clone(),
                message: error.to_string(),
            })?;
        decode_body(status, &body)
    }
}
