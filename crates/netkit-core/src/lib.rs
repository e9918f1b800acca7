//! Core multipart types for netkit.
//!
//! This crate provides the building blocks for multipart/form-data request
//! bodies:
//! - [`UploadFile`] describing one file part, in memory or streamed
//! - [`AggregateStream`] chaining many [`ByteSource`]s into one stream
//! - [`PartEncoder`] rendering individual parts
//! - [`MultipartBodyBuilder`] assembling whole bodies
//!
//! # Design Principles
//!
//! - Pull-based, synchronous reading; any transport that drives
//!   [`std::io::Read`] can consume a body
//! - Files larger than memory are never loaded whole
//! - Buffered and streamed bodies are byte-identical
//! - Logging goes through an injected sink, never global state
//!
//! # Example
//!
//! ```ignore
//! use netkit_core::{FormData, FormParameter, MultipartBodyBuilder, UploadFile};
//!
//! let form = FormData::new(
//!     vec![FormParameter::new("title", "holiday")],
//!     vec![UploadFile::from_path("photo", "/tmp/beach.jpg")?],
//! );
//! let body = MultipartBodyBuilder::new().build_form(form);
//! assert!(body.is_streamed());
//! ```

#![forbid(unsafe_code)]

pub mod builder;
pub mod encoder;
pub mod error;
pub mod form;
pub mod logging;
pub mod mime;
pub mod source;
pub mod stream;
pub mod upload;

pub use builder::{BodyContent, BodyMode, BuilderConfig, MultipartBody, MultipartBodyBuilder};
pub use encoder::{LINE_BREAK, PartEncoder};
pub use error::{StreamError, UploadError};
pub use form::{BOUNDARY_PREFIX, FormData, FormParameter, content_type_for, generate_boundary};
pub use logging::{
    LogCrateSink, LogEntry, LogLevel, LogSink, MemorySink, NoopSink, SharedSink, format_size,
};
pub use mime::MimeType;
pub use source::{
    BufferedSource, ByteSource, Readable, StreamHandle, StreamStatus, StreamingSource,
};
pub use stream::AggregateStream;
pub use upload::{DEFAULT_MEMORY_WARNING_THRESHOLD, FilePayload, UploadConfig, UploadFile};
