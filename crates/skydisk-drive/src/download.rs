//! Values handed back to callers of the drive.

use std::fmt;

use skydisk_backend::ByteStream;

/// How a client should present downloaded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Save as a file.
    Attachment,
    /// Render in place.
    Inline,
}

impl Disposition {
    /// `Content-Disposition` header value for `filename`.
    #[must_use]
    pub fn header_value(self, filename: &str) -> String {
        let kind = match self {
            Self::Attachment => "attachment",
            Self::Inline => "inline",
        };
        let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{kind}; filename=\"{escaped}\"")
    }
}

/// An open file ready to stream to a client.
pub struct FileDownload {
    /// File content.
    pub reader: ByteStream,
    /// Stored content type, or `application/octet-stream`.
    pub content_type: String,
    /// Leaf name of the entry.
    pub filename: String,
    /// Size recorded in the catalog.
    pub size: u64,
    /// Presentation hint.
    pub disposition: Disposition,
}

impl fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDownload")
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .field("size", &self.size)
            .field("disposition", &self.disposition)
            .finish_non_exhaustive()
    }
}

/// A freshly created short link.
#[derive(Clone, PartialEq, Eq)]
pub struct ShortLinkGrant {
    /// Link token.
    pub token: String,
    /// Public URL of the link.
    pub url: String,
    /// Code the holder must present, if one was set.
    pub access_code: Option<String>,
}

impl fmt::Debug for ShortLinkGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortLinkGrant")
            .field("token", &self.token)
            .field("url", &self.url)
            .field("has_access_code", &self.access_code.is_some())
            .finish()
    }
}
