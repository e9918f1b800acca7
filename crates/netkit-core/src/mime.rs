//! MIME type resolution from file extensions.

use std::path::Path;

/// A MIME type resolved from a known file extension.
///
/// Only constructible through resolution, so an upload never carries a
/// made-up content type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType(String);

impl MimeType {
    /// Resolve a MIME type from a bare extension (`"png"`, `"TXT"`, `".json"`).
    ///
    /// Returns `None` for empty or unknown extensions.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim().trim_start_matches('.');
        if extension.is_empty() {
            return None;
        }
        mime_guess::from_ext(extension)
            .first()
            .map(|mime| Self(mime.essence_str().to_string()))
    }

    /// Resolve a MIME type from a file name by its extension.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = split_name_and_extension(file_name);
        Self::from_extension(extension?)
    }

    /// The MIME type as a string, e.g. `image/jpeg`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MimeType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split `"photo.large.jpg"` into `("photo.large", Some("jpg"))`.
///
/// Names without a dot, or whose only dot is leading (`".profile"`), have no
/// extension.
#[must_use]
pub fn split_name_and_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    }
}

/// The last path component as UTF-8, if any.
pub(crate) fn file_name_of(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
