//! Transport-side body reading.
//!
//! A transport pulls request bodies a chunk at a time, either through
//! [`BodyReader`] (any [`Body`] as [`std::io::Read`]) or by handing a writer
//! to [`pump_body`].
//!
//! # Example
//!
//! ```ignore
//! use netkit_http::body::{BodyConfig, pump_body};
//!
//! let config = BodyConfig::default().with_chunk_size(16 * 1024);
//! let sent = pump_body(request.take_body(), &mut socket, &config)?;
//! ```

use std::io::{Cursor, Read, Write};

use netkit_core::AggregateStream;

use crate::request::Body;

/// Default chunk size for pumping bodies (64KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for body transfer.
#[derive(Debug, Clone)]
pub struct BodyConfig {
    /// Size of each read from the body.
    chunk_size: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BodyConfig {
    /// Create a new body configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size. Zero is treated as one.
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Returns the chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// Error types for body transfer.
#[derive(Debug)]
pub enum BodyError {
    /// Reading the body failed.
    Source(std::io::Error),
    /// Writing to the destination failed.
    Sink(std::io::Error),
}

impl std::fmt::Display for BodyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(e) => write!(f, "failed to read request body: {e}"),
            Self::Sink(e) => write!(f, "failed to write request body: {e}"),
        }
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) | Self::Sink(e) => Some(e),
        }
    }
}

/// Reads any [`Body`] as a byte stream.
#[derive(Debug)]
pub struct BodyReader {
    inner: ReaderInner,
}

#[derive(Debug)]
enum ReaderInner {
    Bytes(Cursor<Vec<u8>>),
    Stream(AggregateStream),
}

impl BodyReader {
    /// Create a reader over `body`.
    #[must_use]
    pub fn new(body: Body) -> Self {
        let inner = match body {
            Body::Empty => ReaderInner::Bytes(Cursor::new(Vec::new())),
            Body::Bytes(bytes) => ReaderInner::Bytes(Cursor::new(bytes)),
            Body::Stream(stream) => ReaderInner::Stream(stream),
        };
        Self { inner }
    }

    /// Stop reading and release any open sources.
    pub fn close(&mut self) {
        if let ReaderInner::Stream(stream) = &mut self.inner {
            stream.close();
        }
    }
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ReaderInner::Bytes(cursor) => cursor.read(buf),
            ReaderInner::Stream(stream) => stream.read(buf),
        }
    }
}

impl From<Body> for BodyReader {
    fn from(body: Body) -> Self {
        Self::new(body)
    }
}

/// Copy `body` into `writer` in `config.chunk_size()` pieces.
///
/// Returns the number of bytes written. The body is released on return,
/// whether it finished or failed.
///
/// # Errors
///
/// Returns `BodyError::Source` when the body fails to produce bytes and
/// `BodyError::Sink` when `writer` rejects them.
pub fn pump_body<W: Write + ?Sized>(
    body: Body,
    writer: &mut W,
    config: &BodyConfig,
) -> Result<u64, BodyError> {
    let mut reader = BodyReader::new(body);
    let mut buf = vec![0u8; config.chunk_size()];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).map_err(BodyError::Source)?;
        if n == 0 {
            break;
        }
        if let Err(e) = writer.write_all(&buf[..n]) {
            reader.close();
            return Err(BodyError::Sink(e));
        }
        total += n as u64;
    }

    writer.flush().map_err(BodyError::Sink)?;
    Ok(total)
}
