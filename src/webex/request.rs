//! Request planning and body encoding for the messages endpoint.

use reqwest::blocking::multipart::{Form, Part};
use serde_json::{Map, Value};

use crate::attachment::Attachment;
use crate::config::MessageFormat;
use crate::error::{InputError, Result};

/// Media type of JSON request bodies.
pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Multipart field carrying the attachment.
const FILES_FIELD: &str = "files";

/// Where a message is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A person, addressed by email.
    PersonEmail(String),
    /// A room, addressed by its opaque identifier.
    Room(String),
}

impl Destination {
    /// Classify a configured destination.
    ///
    /// Anything containing `@` and no whitespace is an email address;
    /// everything else is a room identifier.
    #[must_use]
    pub fn classify(destination: &str) -> Self {
        let is_email =
            destination.contains('@') && !destination.chars().any(char::is_whitespace);
        if is_email {
            Self::PersonEmail(destination.to_owned())
        } else {
            Self::Room(destination.to_owned())
        }
    }

    /// Request body field that carries the destination.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::PersonEmail(_) => "toPersonEmail",
            Self::Room(_) => "roomId",
        }
    }

    /// The destination value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::PersonEmail(value) | Self::Room(value) => value,
        }
    }
}

/// One request of a batch.
#[derive(Debug)]
pub(crate) struct OutgoingMessage {
    pub(crate) text: Option<String>,
    pub(crate) attachment: Option<Attachment>,
}

/// Split a send call into the requests it needs.
///
/// The message rides with the first attachment; every further attachment
/// goes out alone. Without attachments a single text-only request is made.
pub(crate) fn plan_batch(text: Option<&str>, attachments: Vec<Attachment>) -> Vec<OutgoingMessage> {
    let mut remaining = attachments.into_iter();
    let first = OutgoingMessage {
        text: text.map(str::to_owned),
        attachment: remaining.next(),
    };
    std::iter::once(first)
        .chain(remaining.map(|attachment| OutgoingMessage {
            text: None,
            attachment: Some(attachment),
        }))
        .collect()
}

/// JSON body for a request without an attachment.
pub(crate) fn json_body(
    destination: &Destination,
    format: MessageFormat,
    text: Option<&str>,
) -> Value {
    let mut body = Map::new();
    body.insert(
        destination.field_name().to_owned(),
        Value::String(destination.value().to_owned()),
    );
    if let Some(message) = text {
        body.insert(
            format.field_name().to_owned(),
            Value::String(message.to_owned()),
        );
    }
    Value::Object(body)
}

/// Multipart form for a request carrying one attachment.
///
/// # Errors
///
/// Returns `InputError::InvalidMimeType` when the attachment's MIME type is
/// not a valid media type.
pub(crate) fn multipart_form(
    destination: &Destination,
    format: MessageFormat,
    text: Option<String>,
    attachment: Attachment,
) -> Result<Form> {
    let filename = attachment.display_name().to_owned();
    let mime_type = attachment.content_type().to_owned();
    let part = Part::bytes(attachment.content)
        .file_name(filename.clone())
        .mime_str(&mime_type)
        .map_err(|_| InputError::InvalidMimeType {
            filename,
            mime_type,
        })?;

    let mut form = Form::new().text(destination.field_name(), destination.value().to_owned());
    if let Some(message) = text {
        form = form.text(format.field_name(), message);
    }
    Ok(form.part(FILES_FIELD, part))
}
