//! Chained reading over an ordered sequence of byte sources.
//!
//! [`AggregateStream`] presents many [`ByteSource`]s as one contiguous
//! stream. Sources are opened lazily when the cursor reaches them and closed
//! as soon as they are exhausted, so at most one source holds a file handle
//! at a time regardless of how many files a body contains.
//!
//! # State machine
//!
//! ```text
//! NotOpen ──open/read──▶ Open ──exhausted/close──▶ Closed
//!                          │
//!                          └──source failure──────▶ Error
//! ```
//!
//! Both terminal states are sticky: `Closed` keeps returning end-of-data and
//! `Error` keeps returning the captured failure.

use crate::error::StreamError;
use crate::source::{ByteSource, Readable, StreamStatus, copy_io_error};

/// An ordered chain of byte sources read as a single stream.
#[derive(Debug)]
pub struct AggregateStream {
    sources: Vec<ByteSource>,
    cursor: usize,
    status: StreamStatus,
    failure: Option<(usize, std::io::Error)>,
    delivered: u64,
}

impl Default for AggregateStream {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl AggregateStream {
    /// Create a stream over `sources`, delivered in order.
    #[must_use]
    pub fn new(sources: Vec<ByteSource>) -> Self {
        Self {
            sources,
            cursor: 0,
            status: StreamStatus::NotOpen,
            failure: None,
            delivered: 0,
        }
    }

    /// Append a source to the tail of the sequence.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::AppendAfterEnd` once the stream is closed or
    /// failed; the cursor has already passed the tail at that point.
    pub fn append(&mut self, source: ByteSource) -> Result<(), StreamError> {
        self.ensure_appendable()?;
        self.sources.push(source);
        Ok(())
    }

    /// Append several sources to the tail of the sequence, in order.
    ///
    /// # Errors
    ///
    /// Same as [`append`](Self::append); nothing is appended on error.
    pub fn append_all(
        &mut self,
        sources: impl IntoIterator<Item = ByteSource>,
    ) -> Result<(), StreamError> {
        self.ensure_appendable()?;
        self.sources.extend(sources);
        Ok(())
    }

    /// Number of sources in the sequence, including exhausted ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if the sequence has no sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Index of the source currently being read.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total bytes handed out so far.
    #[must_use]
    pub fn bytes_delivered(&self) -> u64 {
        self.delivered
    }

    /// Returns true if any source in the sequence streams lazily.
    #[must_use]
    pub fn has_streaming_sources(&self) -> bool {
        self.sources.iter().any(ByteSource::is_streaming)
    }

    /// Move from `NotOpen` to `Open`. No-op in any other state.
    pub fn open(&mut self) {
        if self.status == StreamStatus::NotOpen {
            self.status = StreamStatus::Open;
        }
    }

    /// Fill `buf` from the chained sources.
    ///
    /// Keeps pulling from subsequent sources until `buf` is full, so a short
    /// count only happens at the end of the sequence. Returns `Ok(0)` once
    /// closed. A failing source moves the stream to `Error` and the returned
    /// error carries a [`StreamError::UnderlyingSource`]; bytes copied into
    /// `buf` during the failing call are not reported.
    pub fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.status {
            StreamStatus::Closed | StreamStatus::AtEnd => return Ok(0),
            StreamStatus::Error => return Err(self.sticky_error()),
            StreamStatus::NotOpen => self.open(),
            StreamStatus::Open => {}
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let mut total = 0;
        while total < buf.len() {
            let Some(source) = self.sources.get_mut(self.cursor) else {
                self.close();
                break;
            };

            if source.status() == StreamStatus::NotOpen {
                source.open();
            }

            if source.status() == StreamStatus::Error {
                let err = source.error().map_or_else(
                    || std::io::Error::other("byte source failed to open"),
                    copy_io_error,
                );
                return Err(self.fail(err));
            }

            if !source.has_bytes_available() {
                self.advance();
                continue;
            }

            match source.read(&mut buf[total..]) {
                Ok(0) => self.advance(),
                Ok(n) => total += n,
                Err(err) => return Err(self.fail(err)),
            }
        }

        self.delivered += total as u64;
        Ok(total)
    }

    /// Close the stream and release every source not yet exhausted.
    ///
    /// Terminal: later reads return `Ok(0)`. Has no effect on a failed stream.
    pub fn close(&mut self) {
        if matches!(self.status, StreamStatus::Closed | StreamStatus::Error) {
            return;
        }
        self.release_remaining();
        self.status = StreamStatus::Closed;
    }

    /// Returns true while the stream may still deliver bytes.
    #[must_use]
    pub fn has_bytes_available(&self) -> bool {
        matches!(self.status, StreamStatus::NotOpen | StreamStatus::Open)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// The source failure that moved the stream into `Error`.
    #[must_use]
    pub fn error(&self) -> Option<&std::io::Error> {
        self.failure.as_ref().map(|(_, err)| err)
    }

    /// Read everything that remains into a vector.
    pub fn read_to_vec(&mut self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8 * 1024];
        loop {
            let n = self.read(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    fn ensure_appendable(&self) -> Result<(), StreamError> {
        match self.status {
            StreamStatus::Closed | StreamStatus::AtEnd | StreamStatus::Error => {
                Err(StreamError::AppendAfterEnd {
                    status: self.status,
                })
            }
            StreamStatus::NotOpen | StreamStatus::Open => Ok(()),
        }
    }

    fn advance(&mut self) {
        if let Some(source) = self.sources.get_mut(self.cursor) {
            source.close();
        }
        self.cursor += 1;
    }

    fn release_remaining(&mut self) {
        if let Some(rest) = self.sources.get_mut(self.cursor..) {
            for source in rest {
                source.close();
            }
        }
    }

    fn fail(&mut self, err: std::io::Error) -> std::io::Error {
        let index = self.cursor;
        let returned = Self::wrap(index, &err);
        self.failure = Some((index, err));
        self.status = StreamStatus::Error;
        self.release_remaining();
        returned
    }

    fn sticky_error(&self) -> std::io::Error {
        match &self.failure {
            Some((index, err)) => Self::wrap(*index, err),
            None => std::io::Error::other("aggregate stream failed"),
        }
    }

    fn wrap(index: usize, err: &std::io::Error) -> std::io::Error {
        std::io::Error::new(
            err.kind(),
            StreamError::UnderlyingSource {
                index,
                detail: err.to_string(),
            },
        )
    }
}

impl Readable for AggregateStream {
    fn open(&mut self) {
        AggregateStream::open(self);
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        AggregateStream::read(self, buf)
    }

    fn close(&mut self) {
        AggregateStream::close(self);
    }

    fn has_bytes_available(&self) -> bool {
        AggregateStream::has_bytes_available(self)
    }

    fn status(&self) -> StreamStatus {
        AggregateStream::status(self)
    }

    fn error(&self) -> Option<&std::io::Error> {
        AggregateStream::error(self)
    }
}

impl std::io::Read for AggregateStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        AggregateStream::read(self, buf)
    }
}

impl FromIterator<ByteSource> for AggregateStream {
    fn from_iter<I: IntoIterator<Item = ByteSource>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
