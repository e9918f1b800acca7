//! Readable byte sources.
//!
//! A byte source is something that can be opened, read sequentially at most
//! once, and reports end-of-data. Two concrete kinds exist:
//!
//! - [`BufferedSource`]: a fixed in-memory block
//! - [`StreamingSource`]: bytes pulled lazily from a file or an external reader
//!
//! Both are wrapped by the closed [`ByteSource`] enum, and the
//! [`AggregateStream`](crate::AggregateStream) chains any number of them
//! behind the same [`Readable`] capability.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Lifecycle state of a readable source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamStatus {
    /// Not opened yet.
    NotOpen,
    /// Open and readable.
    Open,
    /// All bytes have been delivered.
    AtEnd,
    /// Closed; reads return end-of-data.
    Closed,
    /// A read or open failed; see [`Readable::error`].
    Error,
}

impl StreamStatus {
    /// Returns true for states that can never deliver more bytes.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::AtEnd | Self::Closed | Self::Error)
    }
}

/// The readable byte-source capability.
///
/// `read` returns `Ok(0)` for end-of-data and `Err` for failure; the two are
/// never conflated.
pub trait Readable {
    /// Prepare the source for reading. No-op unless the source is `NotOpen`.
    fn open(&mut self);

    /// Read up to `buf.len()` bytes into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Release the source. Terminal.
    fn close(&mut self);

    /// Returns true if a read could currently deliver bytes.
    fn has_bytes_available(&self) -> bool;

    /// Current lifecycle state.
    fn status(&self) -> StreamStatus;

    /// The error that moved the source into [`StreamStatus::Error`].
    fn error(&self) -> Option<&std::io::Error>;
}

/// Copy of an I/O error that keeps its kind and message.
pub(crate) fn copy_io_error(err: &std::io::Error) -> std::io::Error {
    std::io::Error::new(err.kind(), err.to_string())
}

// ============================================================================
// Buffered
// ============================================================================

/// An in-memory block of bytes.
#[derive(Debug, Clone)]
pub struct BufferedSource {
    data: Vec<u8>,
    position: usize,
    status: StreamStatus,
}

impl BufferedSource {
    /// Wrap an owned buffer.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            position: 0,
            status: StreamStatus::NotOpen,
        }
    }

    /// Total length of the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes not yet delivered.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }
}

impl Readable for BufferedSource {
    fn open(&mut self) {
        if self.status == StreamStatus::NotOpen {
            self.status = StreamStatus::Open;
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.status != StreamStatus::Open {
            return Ok(0);
        }

        let to_read = buf.len().min(self.remaining());
        if to_read == 0 {
            if !buf.is_empty() {
                self.status = StreamStatus::AtEnd;
            }
            return Ok(0);
        }

        buf[..to_read].copy_from_slice(&self.data[self.position..self.position + to_read]);
        self.position += to_read;
        Ok(to_read)
    }

    fn close(&mut self) {
        self.status = StreamStatus::Closed;
        self.data = Vec::new();
        self.position = 0;
    }

    fn has_bytes_available(&self) -> bool {
        self.status == StreamStatus::Open && self.remaining() > 0
    }

    fn status(&self) -> StreamStatus {
        self.status
    }

    fn error(&self) -> Option<&std::io::Error> {
        None
    }
}

// ============================================================================
// Streaming
// ============================================================================

/// Where a streaming source gets its bytes from.
pub enum StreamHandle {
    /// A file on disk, opened on first use.
    Path(PathBuf),
    /// An external reader.
    Reader(Box<dyn Read + Send>),
}

impl StreamHandle {
    /// Handle for a file on disk.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Handle for an arbitrary reader.
    #[must_use]
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// The disk path, for path-backed handles.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Reader(_) => None,
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Reader(_) => f.debug_tuple("Reader").field(&"..").finish(),
        }
    }
}

enum StreamingState {
    Pending(StreamHandle),
    Active(Box<dyn Read + Send>),
    Released,
}

/// A lazily-opened stream of bytes.
///
/// Path-backed handles are not touched until [`Readable::open`] is called,
/// and the reader is dropped (closing the file) as soon as the source is
/// closed or reaches the end.
///
/// A source created with a declared length delivers exactly that many bytes.
/// A reader that ends early fails with `UnexpectedEof`, and one with bytes
/// left over fails with `InvalidData`.
pub struct StreamingSource {
    state: StreamingState,
    status: StreamStatus,
    error: Option<std::io::Error>,
    /// Bytes still owed when the length is declared.
    remaining: Option<u64>,
}

impl StreamingSource {
    /// Create a source from a handle.
    #[must_use]
    pub fn new(handle: StreamHandle) -> Self {
        Self {
            state: StreamingState::Pending(handle),
            status: StreamStatus::NotOpen,
            error: None,
            remaining: None,
        }
    }

    /// Create a source that must deliver exactly `len` bytes.
    #[must_use]
    pub fn with_length(handle: StreamHandle, len: u64) -> Self {
        Self {
            remaining: Some(len),
            ..Self::new(handle)
        }
    }

    /// Bytes still expected before end-of-data, for sources with a declared
    /// length.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    /// Source reading from a file on disk.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(StreamHandle::path(path))
    }

    /// Source reading from an arbitrary reader.
    #[must_use]
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::new(StreamHandle::reader(reader))
    }

    fn fail(&mut self, err: &std::io::Error) {
        self.error = Some(copy_io_error(err));
        self.status = StreamStatus::Error;
        self.state = StreamingState::Released;
    }
}

impl std::fmt::Debug for StreamingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            StreamingState::Pending(handle) => format!("Pending({handle:?})"),
            StreamingState::Active(_) => "Active".to_string(),
            StreamingState::Released => "Released".to_string(),
        };
        f.debug_struct("StreamingSource")
            .field("state", &state)
            .field("status", &self.status)
            .field("error", &self.error)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl Readable for StreamingSource {
    fn open(&mut self) {
        if self.status != StreamStatus::NotOpen {
            return;
        }

        let state = std::mem::replace(&mut self.state, StreamingState::Released);
        match state {
            StreamingState::Pending(StreamHandle::Path(path)) => match File::open(&path) {
                Ok(file) => {
                    self.state = StreamingState::Active(Box::new(file));
                    self.status = StreamStatus::Open;
                }
                Err(err) => self.fail(&err),
            },
            StreamingState::Pending(StreamHandle::Reader(reader)) => {
                self.state = StreamingState::Active(reader);
                self.status = StreamStatus::Open;
            }
            other => self.state = other,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.status {
            StreamStatus::Open => {}
            StreamStatus::Error => {
                return Err(self.error.as_ref().map_or_else(
                    || std::io::Error::other("stream failed"),
                    copy_io_error,
                ));
            }
            _ => return Ok(0),
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let StreamingState::Active(reader) = &mut self.state else {
            return Ok(0);
        };

        let result = match self.remaining {
            None => read_retrying(reader, buf),
            Some(0) => ensure_exhausted(reader),
            Some(remaining) => {
                let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
                match read_retrying(reader, &mut buf[..len]) {
                    Ok(0) => Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("stream ended {remaining} bytes short of its declared length"),
                    )),
                    other => other,
                }
            }
        };

        match result {
            Ok(0) => {
                self.status = StreamStatus::AtEnd;
                self.state = StreamingState::Released;
                Ok(0)
            }
            Ok(n) => {
                if let Some(remaining) = &mut self.remaining {
                    *remaining -= n as u64;
                }
                Ok(n)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        self.state = StreamingState::Released;
        if self.status != StreamStatus::Error {
            self.status = StreamStatus::Closed;
        }
    }

    fn has_bytes_available(&self) -> bool {
        self.status == StreamStatus::Open
    }

    fn status(&self) -> StreamStatus {
        self.status
    }

    fn error(&self) -> Option<&std::io::Error> {
        self.error.as_ref()
    }
}

fn read_retrying<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            other => return other,
        }
    }
}

/// `Ok(0)` if the reader has nothing left, an error if it does.
fn ensure_exhausted<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<usize> {
    let mut probe = [0u8; 1];
    match read_retrying(reader, &mut probe)? {
        0 => Ok(0),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "stream produced more bytes than its declared length",
        )),
    }
}

// ============================================================================
// ByteSource
// ============================================================================

/// A single readable piece of a request body.
#[derive(Debug)]
pub enum ByteSource {
    /// Bytes already in memory.
    Buffered(BufferedSource),
    /// Bytes pulled lazily from a file or reader.
    Streaming(StreamingSource),
}

impl ByteSource {
    /// Buffered source over owned bytes.
    #[must_use]
    pub fn buffered(data: impl Into<Vec<u8>>) -> Self {
        Self::Buffered(BufferedSource::new(data))
    }

    /// Streaming source over a handle.
    #[must_use]
    pub fn streaming(handle: StreamHandle) -> Self {
        Self::Streaming(StreamingSource::new(handle))
    }

    /// Streaming source that must deliver exactly `len` bytes.
    #[must_use]
    pub fn streaming_with_length(handle: StreamHandle, len: u64) -> Self {
        Self::Streaming(StreamingSource::with_length(handle, len))
    }

    /// Returns true for streaming sources.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(data: Vec<u8>) -> Self {
        Self::buffered(data)
    }
}

impl From<StreamHandle> for ByteSource {
    fn from(handle: StreamHandle) -> Self {
        Self::streaming(handle)
    }
}

impl Readable for ByteSource {
    fn open(&mut self) {
        match self {
            Self::Buffered(source) => source.open(),
            Self::Streaming(source) => source.open(),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Buffered(source) => source.read(buf),
            Self::Streaming(source) => source.read(buf),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Buffered(source) => source.close(),
            Self::Streaming(source) => source.close(),
        }
    }

    fn has_bytes_available(&self) -> bool {
        match self {
            Self::Buffered(source) => source.has_bytes_available(),
            Self::Streaming(source) => source.has_bytes_available(),
        }
    }

    fn status(&self) -> StreamStatus {
        match self {
            Self::Buffered(source) => source.status(),
            Self::Streaming(source) => source.status(),
        }
    }

    fn error(&self) -> Option<&std::io::Error> {
        match self {
            Self::Buffered(source) => source.error(),
            Self::Streaming(source) => source.error(),
        }
    }
}
