//! Error types for upload construction and stream reading.

use std::path::PathBuf;

use crate::source::StreamStatus;

/// Errors raised while constructing an [`UploadFile`](crate::UploadFile).
#[derive(Debug)]
pub enum UploadError {
    /// The file extension does not map to a known MIME type.
    UnknownMimeType {
        /// The extension that failed to resolve (empty when the name has none).
        extension: String,
    },
    /// File size or existence could not be determined.
    FileMetadataUnavailable {
        /// Path that was inspected.
        path: PathBuf,
        /// Underlying cause.
        detail: String,
    },
    /// The form field key is empty.
    EmptyKey,
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMimeType { extension } if extension.is_empty() => {
                write!(f, "unknown MIME type: file name has no extension")
            }
            Self::UnknownMimeType { extension } => {
                write!(f, "unknown MIME type for extension `{extension}`")
            }
            Self::FileMetadataUnavailable { path, detail } => {
                write!(
                    f,
                    "file metadata unavailable for {}: {detail}",
                    path.display()
                )
            }
            Self::EmptyKey => write!(f, "form field key must not be empty"),
        }
    }
}

impl std::error::Error for UploadError {}

/// Errors raised by an [`AggregateStream`](crate::AggregateStream).
///
/// Read failures travel inside a [`std::io::Error`] whose inner error is a
/// `StreamError::UnderlyingSource`; use [`StreamError::from_io`] to recover it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// A wrapped source failed while being opened or read.
    UnderlyingSource {
        /// Position of the failing source in the sequence.
        index: usize,
        /// Message of the original error.
        detail: String,
    },
    /// A source was appended after the stream reached a terminal state.
    AppendAfterEnd {
        /// The terminal state at the time of the append.
        status: StreamStatus,
    },
}

impl StreamError {
    /// Extract a `StreamError` carried inside an I/O error, if any.
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Option<&StreamError> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<StreamError>())
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnderlyingSource { index, detail } => {
                write!(f, "byte source #{index} failed: {detail}")
            }
            Self::AppendAfterEnd { status } => {
                write!(f, "cannot append to a stream in state {status:?}")
            }
        }
    }
}

impl std::error::Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_display() {
        let err = UploadError::UnknownMimeType {
            extension: "zzz".to_string(),
        };
        assert_eq!(err.to_string(), "unknown MIME type for extension `zzz`");

        let err = UploadError::UnknownMimeType {
            extension: String::new(),
        };
        assert!(err.to_string().contains("no extension"));

        let err = UploadError::FileMetadataUnavailable {
            path: PathBuf::from("/missing/file.bin"),
            detail: "not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "file metadata unavailable for /missing/file.bin: not found"
        );
    }

    #[test]
    fn stream_error_roundtrips_through_io_error() {
        let inner = StreamError::UnderlyingSource {
            index: 3,
            detail: "disk gone".to_string(),
        };
        let io = std::io::Error::other(inner.clone());
        assert_eq!(StreamError::from_io(&io), Some(&inner));
        assert_eq!(io.to_string(), "byte source #3 failed: disk gone");

        let plain = std::io::Error::other("plain");
        assert!(StreamError::from_io(&plain).is_none());
    }
}
