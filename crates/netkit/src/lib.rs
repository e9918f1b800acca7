//! HTTP client conveniences for mobile apps, centred on streaming
//! multipart/form-data uploads.
//!
//! netkit builds request bodies from text fields and files without loading
//! large files into memory:
//!
//! - **Two body modes**: fully buffered when every file is in memory, one
//!   chained stream as soon as any file is streamed
//! - **Lazy file access**: disk files are opened only when the transport
//!   reaches them and closed as soon as they are exhausted
//! - **Pull-based transport**: bodies implement [`std::io::Read`]
//!
//! # Quick Start
//!
//! ```ignore
//! use netkit::prelude::*;
//!
//! let form = FormData::new(
//!     vec![FormParameter::new("user", "42")],
//!     vec![
//!         UploadFile::from_bytes("avatar", "avatar.png", png_bytes)?,
//!         UploadFile::from_path("backup", "/data/backup.zip")?,
//!     ],
//! );
//!
//! let mut request = Request::new(Method::Post, "https://api.example.com/upload")
//!     .with_form_data(form, &MultipartBodyBuilder::new());
//! pump_body(request.take_body(), &mut connection, &BodyConfig::default())?;
//! ```
//!
//! # Crate Structure
//!
//! - [`netkit_core`]: uploads, byte sources, aggregate stream, body builder
//! - [`netkit_http`]: request model and transport-side body pump

#![forbid(unsafe_code)]

// Re-export crates
pub use netkit_core as core;
pub use netkit_http as http;

pub use netkit_core::{
    AggregateStream, BodyContent, BodyMode, BuilderConfig, ByteSource, FilePayload, FormData,
    FormParameter, MimeType, MultipartBody, MultipartBodyBuilder, PartEncoder, Readable,
    StreamError, StreamHandle, StreamStatus, UploadConfig, UploadError, UploadFile,
};
pub use netkit_http::{Body, BodyConfig, BodyError, BodyReader, Headers, Method, Request, pump_body};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Body, BodyConfig, BodyError, BuilderConfig, FormData, FormParameter, Method,
        MultipartBody, MultipartBodyBuilder, Request, StreamError, UploadConfig, UploadError,
        UploadFile, pump_body,
    };
    pub use netkit_core::logging::{LogCrateSink, LogLevel, MemorySink, SharedSink};
}
