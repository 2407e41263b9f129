//! Download of URL attachments.

use percent_encoding::percent_decode_str;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use tracing::debug;

use super::{Attachment, DEFAULT_FILENAME, extension_of, guess_mime_type, url_scheme};
use crate::error::{InputError, NetworkError, Result};

/// Download `reference` with `http` and build an attachment from the response.
///
/// The file name comes from the `Content-Disposition` header, then the last
/// URL path segment (percent-decoded), then [`DEFAULT_FILENAME`]. The MIME
/// type is the `Content-Type` header verbatim, else a guess from the file
/// name. No `Authorization` header is sent.
///
/// # Errors
///
/// Returns `InputError::UnsupportedScheme` for anything but `http`/`https`
/// (before any network traffic), `InputError::InvalidUrl` when the reference
/// does not parse, `NetworkError::RequestFailed` on transport failure and
/// `NetworkError::DownloadFailed` on a non-2xx status.
pub(crate) fn fetch(http: &Client, reference: &str) -> Result<Attachment> {
    let url = parse_download_url(reference)?;

    debug!(url = %url, "downloading attachment");
    let response = http
        .get(url.clone())
        .send()
        .map_err(|error| NetworkError::RequestFailed {
            url: url.to_string(),
            message: error.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let filename = filename_from_headers(response.headers())
        .or_else(|| filename_from_url(&url))
        .unwrap_or_else(|| DEFAULT_FILENAME.to_owned());
    let mime_type = header_text(response.headers(), CONTENT_TYPE.as_str())
        .map(str::to_owned)
        .or_else(|| guess_mime_type(&filename));

    let content = response
        .bytes()
        .map_err(|error| NetworkError::RequestFailed {
            url: url.to_string(),
            message: error.to_string(),
        })?
        .to_vec();

    Ok(Attachment {
        mime_type,
        extension: extension_of(&filename),
        filename: Some(filename),
        content,
    })
}

/// Validate the scheme and parse `reference` as a URL.
fn parse_download_url(reference: &str) -> Result<Url> {
    let scheme = url_scheme(reference).unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return Err(InputError::UnsupportedScheme {
            scheme: scheme.to_owned(),
            reference: reference.to_owned(),
        }
        .into());
    }

    Url::parse(reference).map_err(|error| {
        InputError::InvalidUrl {
            reference: reference.to_owned(),
            message: error.to_string(),
        }
        .into()
    })
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn filename_from_headers(headers: &HeaderMap) -> Option<String> {
    header_text(headers, CONTENT_DISPOSITION.as_str()).and_then(parse_content_disposition)
}

/// Extract the file name from a `Content-Disposition` value.
///
/// An RFC 5987 `filename*=charset''value` parameter wins over a plain
/// `filename=` parameter. Parameters are split outside quoted strings, and
/// quotes and backslash escapes are removed from quoted values.
pub(super) fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in split_params(value) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let unquoted = unquote(raw);
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = unquoted
                    .split_once("''")
                    .map_or(unquoted.as_str(), |(_, rest)| rest);
                extended = Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned());
            }
            "filename" => plain = Some(unquoted),
            _ => {}
        }
    }
    extended.or(plain).filter(|name| !name.is_empty())
}

/// Split a header value on `;` outside double-quoted strings.
fn split_params(value: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            escaped = false;
        } else if quoted && c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        } else if c == ';' && !quoted {
            params.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
    }
    params.push(current);
    params
}

/// Strip surrounding quotes and backslash escapes from a parameter value.
fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix('"') else {
        return trimmed.to_owned();
    };
    let mut text = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => text.extend(chars.next()),
            '"' => break,
            _ => text.push(c),
        }
    }
    text
}

/// The last path segment of `url`, percent-decoded.
pub(super) fn filename_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .next_back()
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
