//! Attachment resolution.
//!
//! An [`Attachment`] is a named, typed byte payload held in memory for the
//! duration of one send. Attachments come from three kinds of
//! [`AttachmentSource`]: a local path, an HTTP(S) URL, or bytes the caller
//! already holds.
//!
//! Local files are read through `cap_std::fs_utf8` by opening the parent
//! directory of the canonical path as a capability handle, so symlinks that
//! point outside their own directory still resolve. URL downloads live in the `remote`
//! submodule and reuse the dispatcher's HTTP client.

mod remote;


use std::fmt;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::error::{FilesystemError, NotifyError, Result};

pub(crate) use remote::fetch;

/// MIME type used when nothing better is known.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// File name used when a source does not provide one.
pub const DEFAULT_FILENAME: &str = "attachment";

/// A resolved attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// File name presented to Webex.
    pub filename: Option<String>,
    /// File extension without the leading dot.
    pub extension: Option<String>,
    /// Raw content.
    pub content: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from bytes the caller already holds.
    ///
    /// When `mime_type` is `None` it is guessed from the file name's
    /// extension and left unset if the extension is unknown. Empty content is
    /// accepted here and rejected when the attachment is sent.
    #[must_use]
    pub fn from_bytes(
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
        mime_type: Option<&str>,
    ) -> Self {
        let name = filename.into();
        let mime = mime_type
            .map(str::to_owned)
            .or_else(|| guess_mime_type(&name));
        Self {
            mime_type: mime,
            extension: extension_of(&name),
            filename: Some(name).filter(|text| !text.is_empty()),
            content: content.into(),
        }
    }

    /// Read a local file into an attachment.
    ///
    /// The file name is the path's base name, as given rather than after
    /// following symlinks, and the MIME type is guessed from its extension,
    /// falling back to [`DEFAULT_MIME_TYPE`].
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError::NotFound` when the path does not name an
    /// existing regular file, and `FilesystemError::IoError` when it cannot
    /// be read.
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let resolved = path
            .canonicalize_utf8()
            .map_err(|error| filesystem_error(path, &error))?;
        let (dir, file_name) = open_parent_directory(&resolved, path)?;
        let name = path.file_name().unwrap_or(file_name);
        Self::from_dir(&dir, file_name, name, path)
    }

    /// Read `file_name` from an already-opened directory capability.
    ///
    /// `name` is the file name to present and `display_path` the path used
    /// in errors.
    fn from_dir(dir: &Dir, file_name: &str, name: &str, display_path: &Utf8Path) -> Result<Self> {
        if !dir.is_file(file_name) {
            return Err(FilesystemError::NotFound {
                path: display_path.to_owned(),
            }
            .into());
        }
        let content = dir
            .read(file_name)
            .map_err(|error| filesystem_error(display_path, &error))?;

        let mime = guess_mime_type(name).unwrap_or_else(|| DEFAULT_MIME_TYPE.to_owned());
        Ok(Self {
            mime_type: Some(mime),
            filename: Some(name.to_owned()),
            extension: extension_of(name),
            content,
        })
    }

    /// File name to present on the wire.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
    }

    /// MIME type to present on the wire.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Whether the attachment carries no content.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("mime_type", &self.mime_type)
            .field("filename", &self.filename)
            .field("extension", &self.extension)
            .field("content_len", &self.content.len())
            .finish()
    }
}

/// Where an attachment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// A file on the local filesystem.
    LocalPath(Utf8PathBuf),
    /// An `http` or `https` URL to download.
    RemoteUrl(String),
    /// Content the caller already holds.
    InMemory(Attachment),
}

impl AttachmentSource {
    /// Classify a string reference.
    ///
    /// A reference with a `scheme://` prefix is a URL, anything else is a
    /// local path. Schemes other than HTTP(S) are classified as URLs and
    /// rejected when resolved.
    #[must_use]
    pub fn classify(reference: &str) -> Self {
        if url_scheme(reference).is_some() {
            Self::RemoteUrl(reference.to_owned())
        } else {
            Self::LocalPath(Utf8PathBuf::from(reference))
        }
    }
}

impl From<Attachment> for AttachmentSource {
    fn from(attachment: Attachment) -> Self {
        Self::InMemory(attachment)
    }
}

impl From<Utf8PathBuf> for AttachmentSource {
    fn from(path: Utf8PathBuf) -> Self {
        Self::LocalPath(path)
    }
}

/// Guess a MIME type from a file name's extension.
#[must_use]
pub fn guess_mime_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_owned())
}

/// Extension of `filename` without the leading dot.
fn extension_of(filename: &str) -> Option<String> {
    Utf8Path::new(filename)
        .extension()
        .filter(|ext| !ext.is_empty())
        .map(str::to_owned)
}

/// The scheme of a `scheme://` reference, if it has one.
fn url_scheme(reference: &str) -> Option<&str> {
    let (scheme, _) = reference.split_once("://")?;
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (starts_alpha && rest_valid).then_some(scheme)
}

/// Open the parent directory of `resolved` as a capability handle.
///
/// Errors are reported against `display_path`, the path the caller gave.
fn open_parent_directory<'a>(
    resolved: &'a Utf8Path,
    display_path: &Utf8Path,
) -> Result<(Dir, &'a str)> {
    let parent = resolved
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = resolved
        .file_name()
        .ok_or_else(|| FilesystemError::NotFound {
            path: display_path.to_owned(),
        })?;

    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|error| filesystem_error(display_path, &error))?;
    Ok((dir, file_name))
}

/// Map an I/O error on `path` into the filesystem error family.
fn filesystem_error(path: &Utf8Path, error: &io::Error) -> NotifyError {
    let mapped = if error.kind() == io::ErrorKind::NotFound {
        FilesystemError::NotFound {
            path: path.to_owned(),
        }
    } else {
        FilesystemError::IoError {
            path: path.to_owned(),
            message: error.to_string(),
        }
    };
    mapped.into()
}
