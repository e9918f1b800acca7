//! Outgoing HTTP request types.

use std::collections::HashMap;

use netkit_core::{
    AggregateStream, BodyContent, ByteSource, FilePayload, FormData, MultipartBody,
    MultipartBodyBuilder, UploadFile,
};

/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "content-type";
/// `Content-Length` header name.
pub const CONTENT_LENGTH: &str = "content-length";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// The method name as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP headers collection.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HashMap<String, Vec<u8>>,
}

impl Headers {
    /// Create empty headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Get a header value as UTF-8 text.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Insert a header, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.inner
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Iterate over all headers as (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.inner
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_slice()))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Request body.
#[derive(Debug, Default)]
pub enum Body {
    /// Empty body.
    #[default]
    Empty,
    /// Bytes body.
    Bytes(Vec<u8>),
    /// Chained stream, read a piece at a time by the transport.
    Stream(AggregateStream),
}

impl Body {
    /// Get body as bytes, consuming it and draining a stream body.
    pub fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Empty => Ok(Vec::new()),
            Self::Bytes(b) => Ok(b),
            Self::Stream(mut stream) => stream.read_to_vec(),
        }
    }

    /// Check if body is known to be empty.
    ///
    /// Stream bodies are never reported empty without reading them.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bytes(b) => b.is_empty(),
            Self::Stream(_) => false,
        }
    }

    /// Returns true for stream bodies.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<AggregateStream> for Body {
    fn from(stream: AggregateStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<MultipartBody> for Body {
    fn from(body: MultipartBody) -> Self {
        match body.into_content() {
            BodyContent::Buffer(bytes) => Self::Bytes(bytes),
            BodyContent::Stream(stream) => Self::Stream(stream),
        }
    }
}

/// Outgoing HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: String,
    headers: Headers,
    body: Body,
}

impl Request {
    /// Create a new request.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Get the HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Get the target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get mutable headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Get the body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Take the body, replacing with Empty.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// Set the body.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Encode `form` as the multipart body of this request.
    ///
    /// `Content-Type` and `Content-Length` are taken from the built body, so
    /// the header boundary always matches the one framing the parts.
    pub fn set_form_data(&mut self, form: FormData, builder: &MultipartBodyBuilder) {
        let body = builder.build_form(form);
        self.headers.insert(CONTENT_TYPE, body.content_type());
        self.headers
            .insert(CONTENT_LENGTH, body.content_length().to_string());
        self.body = Body::from(body);
    }

    /// Builder-style variant of [`set_form_data`](Self::set_form_data).
    #[must_use]
    pub fn with_form_data(mut self, form: FormData, builder: &MultipartBodyBuilder) -> Self {
        self.set_form_data(form, builder);
        self
    }

    /// Send `file` as the raw request body.
    ///
    /// `Content-Type` is the file's MIME type and `Content-Length` its size.
    /// In-memory files become a bytes body. Streamed files become a stream
    /// body held to the declared size.
    pub fn set_file(&mut self, file: UploadFile) {
        self.headers.insert(CONTENT_TYPE, file.mime_type().as_str());
        self.headers.insert(CONTENT_LENGTH, file.size().to_string());
        let size = file.size();
        self.body = match file.into_payload() {
            FilePayload::Embedded(data) => Body::Bytes(data),
            FilePayload::Stream(handle) => Body::Stream(AggregateStream::new(vec![
                ByteSource::streaming_with_length(handle, size),
            ])),
        };
    }

    /// Builder-style variant of [`set_file`](Self::set_file).
    #[must_use]
    pub fn with_file(mut self, file: UploadFile) -> Self {
        self.set_file(file);
        self
    }
}
