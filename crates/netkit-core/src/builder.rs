//! Assembly of complete multipart bodies.
//!
//! [`MultipartBodyBuilder`] picks one of two representations per body:
//!
//! - **Buffered**: every file is in memory, so the whole body is rendered
//!   into one contiguous buffer.
//! - **Streamed**: at least one file is stream-backed, so every part becomes
//!   a byte source and the body is a single [`AggregateStream`].
//!
//! The choice is all-or-nothing. Both representations produce the same
//! bytes for the same input.

use memchr::memmem;

use crate::encoder::PartEncoder;
use crate::form::{FormData, FormParameter, content_type_for};
use crate::logging::{LogEntry, LogLevel, SharedSink, noop_sink};
use crate::source::ByteSource;
use crate::stream::AggregateStream;
use crate::upload::UploadFile;

/// How a body is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyMode {
    /// One contiguous in-memory buffer.
    Buffered,
    /// One chained stream.
    Streamed,
}

impl BodyMode {
    /// `Streamed` if any file is stream-backed, otherwise `Buffered`.
    #[must_use]
    pub fn select(files: &[UploadFile]) -> Self {
        if files.iter().any(UploadFile::is_streamed) {
            Self::Streamed
        } else {
            Self::Buffered
        }
    }

    /// Lowercase name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Streamed => "streamed",
        }
    }
}

/// The bytes of a built body.
#[derive(Debug)]
pub enum BodyContent {
    /// The whole body in memory.
    Buffer(Vec<u8>),
    /// The body as a chained stream.
    Stream(AggregateStream),
}

impl BodyContent {
    /// View the content as a stream, wrapping a buffer as a single source.
    #[must_use]
    pub fn into_stream(self) -> AggregateStream {
        match self {
            Self::Buffer(data) => AggregateStream::new(vec![ByteSource::buffered(data)]),
            Self::Stream(stream) => stream,
        }
    }

    /// Collect the content into memory, reading the stream to its end.
    pub fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Buffer(data) => Ok(data),
            Self::Stream(mut stream) => stream.read_to_vec(),
        }
    }
}

/// A complete multipart/form-data body and the boundary it was framed with.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    content: BodyContent,
    content_length: u64,
}

impl MultipartBody {
    /// The boundary used to frame the body.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The `Content-Type` header value matching this body.
    #[must_use]
    pub fn content_type(&self) -> String {
        content_type_for(&self.boundary)
    }

    /// Length of the body in bytes.
    ///
    /// Streamed bodies count stream-backed files at their declared size.
    #[must_use]
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Which representation the body uses.
    #[must_use]
    pub fn mode(&self) -> BodyMode {
        match self.content {
            BodyContent::Buffer(_) => BodyMode::Buffered,
            BodyContent::Stream(_) => BodyMode::Streamed,
        }
    }

    /// Returns true for streamed bodies.
    #[must_use]
    pub fn is_streamed(&self) -> bool {
        self.mode() == BodyMode::Streamed
    }

    /// The body content.
    #[must_use]
    pub fn content(&self) -> &BodyContent {
        &self.content
    }

    /// Consume the body, returning its content.
    #[must_use]
    pub fn into_content(self) -> BodyContent {
        self.content
    }

    /// Consume the body, returning boundary and content together.
    #[must_use]
    pub fn into_parts(self) -> (String, BodyContent) {
        (self.boundary, self.content)
    }

    /// Collect the body into memory.
    pub fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        self.content.into_bytes()
    }
}

/// Configuration for body building.
#[derive(Clone)]
pub struct BuilderConfig {
    /// Destination for build-time log entries.
    sink: SharedSink,
    /// Log a warning when in-memory content contains the boundary delimiter.
    warn_on_boundary_collision: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            sink: noop_sink(),
            warn_on_boundary_collision: true,
        }
    }
}

impl std::fmt::Debug for BuilderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderConfig")
            .field("warn_on_boundary_collision", &self.warn_on_boundary_collision)
            .finish_non_exhaustive()
    }
}

impl BuilderConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log sink.
    #[must_use]
    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Enable or disable boundary collision warnings.
    #[must_use]
    pub fn warn_on_boundary_collision(mut self, enabled: bool) -> Self {
        self.warn_on_boundary_collision = enabled;
        self
    }

    /// Get the log sink.
    #[must_use]
    pub fn get_sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Whether boundary collision warnings are enabled.
    #[must_use]
    pub fn get_warn_on_boundary_collision(&self) -> bool {
        self.warn_on_boundary_collision
    }
}

/// Builds multipart bodies from parameters and files.
#[derive(Debug, Clone, Default)]
pub struct MultipartBodyBuilder {
    config: BuilderConfig,
}

impl MultipartBodyBuilder {
    /// Create a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with custom configuration.
    #[must_use]
    pub fn with_config(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// The builder's configuration.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build a body from a [`FormData`], keeping its boundary.
    #[must_use]
    pub fn build_form(&self, form: FormData) -> MultipartBody {
        let (boundary, parameters, files) = form.into_parts();
        self.build(boundary, &parameters, files)
    }

    /// Build a body framed with `boundary`.
    ///
    /// Parts appear parameters first, then files, each in the given order,
    /// followed by the closing boundary.
    #[must_use]
    pub fn build(
        &self,
        boundary: impl Into<String>,
        parameters: &[FormParameter],
        files: Vec<UploadFile>,
    ) -> MultipartBody {
        let boundary = boundary.into();
        self.check_boundary_collisions(&boundary, parameters, &files);

        let encoder = PartEncoder::new(&boundary);
        let parameter_count = parameters.len();
        let file_count = files.len();

        let (content, content_length) = match render_buffered(encoder, parameters, &files) {
            Some(buffer) => {
                let length = buffer.len() as u64;
                (BodyContent::Buffer(buffer), length)
            }
            None => {
                let length = streamed_length(encoder, parameters, &files);
                let stream = render_streamed(encoder, parameters, files);
                (BodyContent::Stream(stream), length)
            }
        };

        let body = MultipartBody {
            boundary,
            content,
            content_length,
        };

        if self.config.sink.enabled(LogLevel::Debug) {
            self.config.sink.log(
                LogEntry::new(LogLevel::Debug, "built multipart body")
                    .field("mode", body.mode().as_str())
                    .field("parameters", parameter_count)
                    .field("files", file_count)
                    .field("boundary", &body.boundary)
                    .field("content_length", body.content_length),
            );
        }
        body
    }

    fn check_boundary_collisions(
        &self,
        boundary: &str,
        parameters: &[FormParameter],
        files: &[UploadFile],
    ) {
        if !self.config.warn_on_boundary_collision || !self.config.sink.enabled(LogLevel::Warn) {
            return;
        }

        let delimiter = format!("--{boundary}");
        let finder = memmem::Finder::new(delimiter.as_bytes());
        let parameter_hits = parameters
            .iter()
            .filter(|p| finder.find(p.value().as_bytes()).is_some())
            .map(FormParameter::key);
        let file_hits = files
            .iter()
            .filter(|f| f.embedded_bytes().is_some_and(|data| finder.find(data).is_some()))
            .map(UploadFile::key);

        for key in parameter_hits.chain(file_hits) {
            self.config.sink.log(
                LogEntry::new(LogLevel::Warn, "boundary delimiter appears inside part content")
                    .field("key", key)
                    .field("boundary", boundary),
            );
        }
    }
}

/// Render the whole body into one buffer, or `None` if any file is streamed.
fn render_buffered(
    encoder: PartEncoder<'_>,
    parameters: &[FormParameter],
    files: &[UploadFile],
) -> Option<Vec<u8>> {
    let embedded = files
        .iter()
        .map(|file| file.embedded_bytes().map(|data| (file, data)))
        .collect::<Option<Vec<_>>>()?;

    let mut parameters_section = Vec::new();
    for parameter in parameters {
        encoder.encode_parameter_into(&mut parameters_section, parameter);
    }

    let mut files_section = Vec::new();
    for (file, data) in embedded {
        encoder.encode_file_into(&mut files_section, file, data);
    }

    let footer = encoder.footer();

    let mut body =
        Vec::with_capacity(parameters_section.len() + files_section.len() + footer.len());
    body.extend_from_slice(&parameters_section);
    body.extend_from_slice(&files_section);
    body.extend_from_slice(&footer);
    Some(body)
}

/// Chain every part as its own source, ending with the footer.
fn render_streamed(
    encoder: PartEncoder<'_>,
    parameters: &[FormParameter],
    files: Vec<UploadFile>,
) -> AggregateStream {
    let mut sources = Vec::with_capacity(parameters.len() + files.len() * 3 + 1);
    sources.extend(
        parameters
            .iter()
            .map(|parameter| ByteSource::buffered(encoder.parameter_part(parameter))),
    );
    for file in files {
        sources.extend(encoder.file_sources(file));
    }
    sources.push(ByteSource::buffered(encoder.footer()));
    AggregateStream::new(sources)
}

/// Body length with stream-backed files counted at their declared size.
fn streamed_length(
    encoder: PartEncoder<'_>,
    parameters: &[FormParameter],
    files: &[UploadFile],
) -> u64 {
    let parameters_len: u64 = parameters
        .iter()
        .map(|p| encoder.parameter_part(p).len() as u64)
        .sum();
    let files_len: u64 = files
        .iter()
        .map(|f| encoder.framing_len(f) + f.size())
        .sum();
    parameters_len + files_len + encoder.footer().len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use std::io::Cursor;
    use std::sync::Arc;

    fn reader_file(key: &str, name: &str, data: &[u8]) -> UploadFile {
        UploadFile::from_reader(key, name, Cursor::new(data.to_vec()), data.len() as u64).unwrap()
    }

    #[test]
    fn empty_body_is_footer_only() {
        let body = MultipartBodyBuilder::new().build("B1", &[], Vec::new());
        assert_eq!(body.mode(), BodyMode::Buffered);
        assert_eq!(body.content_length(), 8);
        assert_eq!(body.into_bytes().unwrap(), b"--B1--\r\n");
    }

    #[test]
    fn single_parameter_body() {
        let body =
            MultipartBodyBuilder::new().build("B1", &[FormParameter::new("name", "hello")], Vec::new());
        assert_eq!(
            body.into_bytes().unwrap(),
            concat!(
                "--B1\r\n",
                "Content-Disposition: form-data; name=\"name\"\r\n\r\n",
                "hello\r\n",
                "--B1--\r\n"
            )
            .as_bytes()
        );
    }

    #[test]
    fn single_file_body() {
        let file = UploadFile::from_bytes("file", "a.txt", b"hi".to_vec()).unwrap();
        let body = MultipartBodyBuilder::new().build("B1", &[], vec![file]);
        assert_eq!(
            body.into_bytes().unwrap(),
            concat!(
                "--B1\r\n",
                "Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n",
                "Content-Type: text/plain\r\n\r\n",
                "hi\r\n",
                "--B1--\r\n"
            )
            .as_bytes()
        );
    }

    #[test]
    fn mode_selection_is_all_or_nothing() {
        let embedded = || UploadFile::from_bytes("a", "a.txt", b"a".to_vec()).unwrap();
        assert_eq!(BodyMode::select(&[]), BodyMode::Buffered);
        assert_eq!(BodyMode::select(&[embedded(), embedded()]), BodyMode::Buffered);
        assert_eq!(
            BodyMode::select(&[embedded(), reader_file("b", "b.txt", b"b"), embedded()]),
            BodyMode::Streamed
        );
    }

    #[test]
    fn one_stream_forces_streamed_body_with_all_parts() {
        let params = [FormParameter::new("p1", "v1"), FormParameter::new("p2", "v2")];
        let files = vec![
            UploadFile::from_bytes("small", "s.txt", b"in memory".to_vec()).unwrap(),
            reader_file("large", "l.txt", b"from a stream"),
        ];
        let body = MultipartBodyBuilder::new().build("BB", &params, files);
        assert!(body.is_streamed());
        let expected_len = body.content_length();

        let bytes = body.into_bytes().unwrap();
        assert_eq!(bytes.len() as u64, expected_len);
        let text = String::from_utf8(bytes).unwrap();
        let p1 = text.find("name=\"p1\"").unwrap();
        let p2 = text.find("name=\"p2\"").unwrap();
        let small = text.find("in memory").unwrap();
        let large = text.find("from a stream").unwrap();
        assert!(p1 < p2 && p2 < small && small < large);
        assert!(text.ends_with("--BB--\r\n"));
    }

    #[test]
    fn streamed_and_buffered_bodies_match() {
        let params = [FormParameter::new("title", "trip"), FormParameter::new("tags", "a,b")];
        let contents: [(&str, &str, &[u8]); 2] =
            [("photo", "p.png", b"\x89PNG..."), ("notes", "n.txt", b"line1\r\nline2")];

        let buffered_files = contents
            .iter()
            .map(|(k, n, d)| UploadFile::from_bytes(*k, *n, d.to_vec()).unwrap())
            .collect();
        let streamed_files = contents
            .iter()
            .map(|(k, n, d)| reader_file(k, n, d))
            .collect();

        let builder = MultipartBodyBuilder::new();
        let buffered = builder.build("SAME", &params, buffered_files);
        let streamed = builder.build("SAME", &params, streamed_files);
        assert_eq!(buffered.mode(), BodyMode::Buffered);
        assert_eq!(streamed.mode(), BodyMode::Streamed);
        assert_eq!(buffered.content_length(), streamed.content_length());
        assert_eq!(buffered.into_bytes().unwrap(), streamed.into_bytes().unwrap());
    }

    #[test]
    fn build_form_keeps_form_boundary() {
        let form = FormData::new(vec![FormParameter::new("k", "v")], Vec::new());
        let boundary = form.boundary().to_string();
        let content_type = form.content_type();

        let body = MultipartBodyBuilder::new().build_form(form);
        assert_eq!(body.boundary(), boundary);
        assert_eq!(body.content_type(), content_type);
        let bytes = body.into_bytes().unwrap();
        assert!(bytes.starts_with(format!("--{boundary}\r\n").as_bytes()));
    }

    #[test]
    fn buffer_content_converts_to_stream() {
        let body = MultipartBodyBuilder::new().build("B", &[FormParameter::new("a", "1")], Vec::new());
        let expected = MultipartBodyBuilder::new()
            .build("B", &[FormParameter::new("a", "1")], Vec::new())
            .into_bytes()
            .unwrap();
        let mut stream = body.into_content().into_stream();
        assert_eq!(stream.read_to_vec().unwrap(), expected);
    }

    #[test]
    fn logs_build_summary() {
        let sink = Arc::new(MemorySink::new());
        let builder = MultipartBodyBuilder::with_config(BuilderConfig::new().sink(sink.clone()));
        let _ = builder.build("LOG", &[FormParameter::new("a", "b")], vec![reader_file("f", "f.txt", b"x")]);

        let debug = sink.entries_at(LogLevel::Debug);
        assert_eq!(debug.len(), 1);
        assert_eq!(debug[0].get_field("mode"), Some("streamed"));
        assert_eq!(debug[0].get_field("parameters"), Some("1"));
        assert_eq!(debug[0].get_field("files"), Some("1"));
        assert_eq!(debug[0].get_field("boundary"), Some("LOG"));
    }

    #[test]
    fn boundary_collision_is_reported_not_rejected() {
        let sink = Arc::new(MemorySink::new());
        let builder = MultipartBodyBuilder::with_config(BuilderConfig::new().sink(sink.clone()));
        let params = [
            FormParameter::new("clean", "nothing here"),
            FormParameter::new("dirty", "oops --X inside"),
        ];
        let files = vec![UploadFile::from_bytes("blob", "b.txt", b"--X".to_vec()).unwrap()];
        let body = builder.build("X", &params, files);
        assert_eq!(body.mode(), BodyMode::Buffered);

        let warnings = sink.entries_at(LogLevel::Warn);
        let keys: Vec<_> = warnings.iter().filter_map(|e| e.get_field("key")).collect();
        assert_eq!(keys, vec!["dirty", "blob"]);
    }

    #[test]
    fn boundary_collision_warning_can_be_disabled() {
        let sink = Arc::new(MemorySink::new());
        let config = BuilderConfig::new()
            .sink(sink.clone())
            .warn_on_boundary_collision(false);
        assert!(!config.get_warn_on_boundary_collision());
        let builder = MultipartBodyBuilder::with_config(config);
        let _ = builder.build("X", &[FormParameter::new("dirty", "--X")], Vec::new());
        assert!(sink.entries_at(LogLevel::Warn).is_empty());
    }
}
