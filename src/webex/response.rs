//! Decoding of Webex responses.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Outcome of a send call.
///
/// A single request yields [`SendResult::Single`]; a batch yields every
/// decoded response in the order the requests were issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SendResult {
    /// Response of the only request.
    Single(Value),
    /// Responses of a multi-request batch.
    Batch(Vec<Value>),
}

impl SendResult {
    pub(crate) fn from_responses(responses: Vec<Value>) -> Self {
        match <[Value; 1]>::try_from(responses) {
            Ok([single]) => Self::Single(single),
            Err(all) => Self::Batch(all),
        }
    }

    /// All decoded responses in issue order.
    #[must_use]
    pub fn responses(&self) -> &[Value] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Batch(values) => values,
        }
    }

    /// Consume the result, returning every decoded response in issue order.
    #[must_use]
    pub fn into_responses(self) -> Vec<Value> {
        match self {
            Self::Single(value) => vec![value],
            Self::Batch(values) => values,
        }
    }
}

/// Turn a status code and body text into a decoded response.
///
/// # Errors
///
/// Returns `ApiError::Status` for a status of 400 or above and
/// `ApiError::InvalidResponse` when the body is not JSON.
pub(crate) fn decode_body(status: u16, body: &str) -> Result<Value> {
    if status >= 400 {
        return Err(ApiError::Status {
            status,
            body: body.to_owned(),
        }
        .into());
    }
    serde_json::from_str(body).map_err(|error| {
        ApiError::InvalidResponse {
            status,
            message: error.to_string(),
        }
        .into()
    })
}
