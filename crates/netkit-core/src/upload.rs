//! Files to upload as part of a multipart form.
//!
//! An [`UploadFile`] carries exactly one payload, chosen by the constructor
//! the caller picks:
//!
//! - [`UploadFile::from_bytes`]: bytes already in memory
//! - [`UploadFile::from_path`]: a file on disk, streamed lazily
//! - [`UploadFile::from_reader`]: an external reader with a known size
//!
//! The choice is never revised afterwards. Large in-memory payloads are
//! reported through the configured [`LogSink`](crate::logging::LogSink) but
//! otherwise accepted as-is.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::UploadError;
use crate::logging::{LogEntry, LogLevel, SharedSink, format_size, noop_sink};
use crate::mime::{MimeType, file_name_of, split_name_and_extension};
use crate::source::{ByteSource, StreamHandle};

/// Default in-memory size above which a warning is logged (10 MiB).
pub const DEFAULT_MEMORY_WARNING_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Configuration for upload file construction.
#[derive(Clone)]
pub struct UploadConfig {
    /// In-memory payload size above which a warning is logged.
    memory_warning_threshold: u64,
    /// Destination for construction-time log entries.
    sink: SharedSink,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            memory_warning_threshold: DEFAULT_MEMORY_WARNING_THRESHOLD,
            sink: noop_sink(),
        }
    }
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("memory_warning_threshold", &self.memory_warning_threshold)
            .finish_non_exhaustive()
    }
}

impl UploadConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the in-memory size above which a warning is logged.
    #[must_use]
    pub fn memory_warning_threshold(mut self, bytes: u64) -> Self {
        self.memory_warning_threshold = bytes;
        self
    }

    /// Set the log sink.
    #[must_use]
    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Get the memory warning threshold.
    #[must_use]
    pub fn get_memory_warning_threshold(&self) -> u64 {
        self.memory_warning_threshold
    }

    /// Get the log sink.
    #[must_use]
    pub fn get_sink(&self) -> &SharedSink {
        &self.sink
    }
}

/// The bytes of an upload: embedded or streamed, never both.
pub enum FilePayload {
    /// Bytes held in memory.
    Embedded(Vec<u8>),
    /// Bytes read lazily from a file or reader.
    Stream(StreamHandle),
}

impl std::fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded(data) => write!(f, "Embedded({} bytes)", data.len()),
            Self::Stream(handle) => f.debug_tuple("Stream").field(handle).finish(),
        }
    }
}

/// A file to upload in a multipart form.
#[derive(Debug)]
pub struct UploadFile {
    key: String,
    name: String,
    path: Option<PathBuf>,
    mime_type: MimeType,
    size: u64,
    payload: FilePayload,
}

impl UploadFile {
    /// Create an upload from in-memory bytes.
    ///
    /// `file_name` is sent as the part's filename and its extension selects
    /// the MIME type.
    pub fn from_bytes(
        key: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self, UploadError> {
        Self::from_bytes_with_config(key, file_name, data, &UploadConfig::default())
    }

    /// Create an upload from in-memory bytes with custom configuration.
    pub fn from_bytes_with_config(
        key: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        config: &UploadConfig,
    ) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        let extension = split_name_and_extension(&file_name)
            .1
            .unwrap_or_default()
            .to_string();
        Self::embedded(key.into(), file_name, &extension, data.into(), config)
    }

    /// Create an upload from in-memory bytes with an explicit extension.
    ///
    /// `name` is sent verbatim as the part's filename.
    pub fn from_bytes_with_extension(
        key: impl Into<String>,
        name: impl Into<String>,
        extension: &str,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self, UploadError> {
        Self::from_bytes_with_extension_and_config(
            key,
            name,
            extension,
            data,
            &UploadConfig::default(),
        )
    }

    /// Create an upload from in-memory bytes with an explicit extension and
    /// custom configuration.
    pub fn from_bytes_with_extension_and_config(
        key: impl Into<String>,
        name: impl Into<String>,
        extension: &str,
        data: impl Into<Vec<u8>>,
        config: &UploadConfig,
    ) -> Result<Self, UploadError> {
        Self::embedded(key.into(), name.into(), extension, data.into(), config)
    }

    /// Create an upload streamed from a file on disk.
    ///
    /// The file is not opened here; only its metadata is read to learn the
    /// size.
    pub fn from_path(key: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, UploadError> {
        Self::from_path_with_config(key, path, &UploadConfig::default())
    }

    /// Create an upload streamed from a file on disk with custom configuration.
    pub fn from_path_with_config(
        key: impl Into<String>,
        path: impl AsRef<Path>,
        config: &UploadConfig,
    ) -> Result<Self, UploadError> {
        let key = non_empty_key(key.into())?;
        let path = path.as_ref();
        let name = file_name_of(path).unwrap_or_default().to_string();
        let mime_type = resolve_mime(split_name_and_extension(&name).1.unwrap_or_default())?;

        let metadata = std::fs::metadata(path).map_err(|e| UploadError::FileMetadataUnavailable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(UploadError::FileMetadataUnavailable {
                path: path.to_path_buf(),
                detail: "not a regular file".to_string(),
            });
        }

        let file = Self {
            key,
            name,
            path: Some(path.to_path_buf()),
            mime_type,
            size: metadata.len(),
            payload: FilePayload::Stream(StreamHandle::path(path)),
        };
        file.log_created(config);
        Ok(file)
    }

    /// Create an upload streamed from an external reader.
    ///
    /// `size` is the number of bytes the reader will produce.
    pub fn from_reader(
        key: impl Into<String>,
        file_name: impl Into<String>,
        reader: impl Read + Send + 'static,
        size: u64,
    ) -> Result<Self, UploadError> {
        Self::from_reader_with_config(key, file_name, reader, size, &UploadConfig::default())
    }

    /// Create an upload streamed from an external reader with custom
    /// configuration.
    pub fn from_reader_with_config(
        key: impl Into<String>,
        file_name: impl Into<String>,
        reader: impl Read + Send + 'static,
        size: u64,
        config: &UploadConfig,
    ) -> Result<Self, UploadError> {
        let key = non_empty_key(key.into())?;
        let name = file_name.into();
        let mime_type = resolve_mime(split_name_and_extension(&name).1.unwrap_or_default())?;

        let file = Self {
            key,
            name,
            path: None,
            mime_type,
            size,
            payload: FilePayload::Stream(StreamHandle::reader(reader)),
        };
        file.log_created(config);
        Ok(file)
    }

    fn embedded(
        key: String,
        name: String,
        extension: &str,
        data: Vec<u8>,
        config: &UploadConfig,
    ) -> Result<Self, UploadError> {
        let key = non_empty_key(key)?;
        let mime_type = resolve_mime(extension)?;
        let file = Self {
            key,
            name,
            path: None,
            mime_type,
            size: data.len() as u64,
            payload: FilePayload::Embedded(data),
        };

        if file.size > config.memory_warning_threshold {
            config.sink.log(
                LogEntry::new(
                    LogLevel::Warn,
                    "holding a large file for upload in memory; performance may suffer when memory is low",
                )
                .field("name", &file.name)
                .field("type", &file.mime_type)
                .field("size", format_size(file.size))
                .field("threshold", format_size(config.memory_warning_threshold)),
            );
        }
        Ok(file)
    }

    fn log_created(&self, config: &UploadConfig) {
        if config.sink.enabled(LogLevel::Debug) {
            config.sink.log(
                LogEntry::new(LogLevel::Debug, "prepared streamed upload")
                    .field("key", &self.key)
                    .field("name", &self.name)
                    .field("size", self.size),
            );
        }
    }

    /// The form field name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The file name sent in `Content-Disposition`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The disk path, for uploads created with [`from_path`](Self::from_path).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The resolved MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The payload.
    #[must_use]
    pub fn payload(&self) -> &FilePayload {
        &self.payload
    }

    /// Returns true when the payload is read lazily.
    #[must_use]
    pub fn is_streamed(&self) -> bool {
        matches!(self.payload, FilePayload::Stream(_))
    }

    /// The embedded bytes, for in-memory uploads.
    #[must_use]
    pub fn embedded_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            FilePayload::Embedded(data) => Some(data),
            FilePayload::Stream(_) => None,
        }
    }

    /// Consume the upload, keeping only its payload.
    #[must_use]
    pub fn into_payload(self) -> FilePayload {
        self.payload
    }

    /// Convert the payload into a byte source for a streamed body.
    ///
    /// Stream-backed payloads must deliver exactly [`size`](Self::size)
    /// bytes; reading fails otherwise.
    #[must_use]
    pub fn into_source(self) -> ByteSource {
        match self.payload {
            FilePayload::Embedded(data) => ByteSource::buffered(data),
            FilePayload::Stream(handle) => ByteSource::streaming_with_length(handle, self.size),
        }
    }

    /// A human-readable description of the upload, for logs.
    ///
    /// ```text
    /// { File From Disk }
    /// - Name: video.mp4
    /// - Type: video/mp4
    /// - Size: 52.4 MB
    /// - Path: /tmp/video.mp4
    /// ```
    #[must_use]
    pub fn summary(&self) -> String {
        let origin = match (&self.payload, &self.path) {
            (FilePayload::Stream(_), Some(_)) => "Disk",
            (FilePayload::Stream(_), None) => "Stream",
            (FilePayload::Embedded(_), _) => "Memory",
        };
        let mut summary = format!(
            "{{ File From {origin} }}\n- Name: {}\n- Type: {}\n- Size: {}",
            self.name,
            self.mime_type,
            format_size(self.size)
        );
        if let Some(path) = &self.path {
            summary.push_str(&format!("\n- Path: {}", path.display()));
        }
        summary
    }
}

fn non_empty_key(key: String) -> Result<String, UploadError> {
    if key.is_empty() {
        Err(UploadError::EmptyKey)
    } else {
        Ok(key)
    }
}

fn resolve_mime(extension: &str) -> Result<MimeType, UploadError> {
    MimeType::from_extension(extension).ok_or_else(|| UploadError::UnknownMimeType {
        extension: extension.to_string(),
    })
}
