//! Rendering of individual multipart parts.
//!
//! Wire layout, with `\r\n` line breaks throughout:
//!
//! ```text
//! --{boundary}
//! Content-Disposition: form-data; name="{key}"
//!
//! {value}
//! --{boundary}
//! Content-Disposition: form-data; name="{key}"; filename="{name}"
//! Content-Type: {mime}
//!
//! {payload}
//! --{boundary}--
//! ```

use crate::form::FormParameter;
use crate::source::ByteSource;
use crate::upload::UploadFile;

/// Line terminator used for all multipart framing.
pub const LINE_BREAK: &str = "\r\n";

/// Renders parts for one boundary.
#[derive(Debug, Clone, Copy)]
pub struct PartEncoder<'a> {
    boundary: &'a str,
}

impl<'a> PartEncoder<'a> {
    /// Create an encoder for `boundary`.
    #[must_use]
    pub fn new(boundary: &'a str) -> Self {
        Self { boundary }
    }

    /// The boundary this encoder frames parts with.
    #[must_use]
    pub fn boundary(&self) -> &'a str {
        self.boundary
    }

    /// Append a rendered parameter part to `out`.
    pub fn encode_parameter_into(&self, out: &mut Vec<u8>, parameter: &FormParameter) {
        self.push_boundary_line(out);
        out.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        out.extend_from_slice(parameter.key().as_bytes());
        out.extend_from_slice(b"\"\r\n\r\n");
        out.extend_from_slice(parameter.value().as_bytes());
        out.extend_from_slice(LINE_BREAK.as_bytes());
    }

    /// Render one parameter part.
    #[must_use]
    pub fn parameter_part(&self, parameter: &FormParameter) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_parameter_into(&mut out, parameter);
        out
    }

    /// Append the framing that precedes a file's payload to `out`.
    pub fn encode_file_header_into(&self, out: &mut Vec<u8>, file: &UploadFile) {
        self.push_boundary_line(out);
        out.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        out.extend_from_slice(file.key().as_bytes());
        out.extend_from_slice(b"\"; filename=\"");
        out.extend_from_slice(file.name().as_bytes());
        out.extend_from_slice(b"\"\r\nContent-Type: ");
        out.extend_from_slice(file.mime_type().as_str().as_bytes());
        out.extend_from_slice(b"\r\n\r\n");
    }

    /// Render the framing that precedes a file's payload.
    #[must_use]
    pub fn file_header(&self, file: &UploadFile) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_file_header_into(&mut out, file);
        out
    }

    /// The line break that follows a file's payload.
    #[must_use]
    pub fn file_trailer(&self) -> &'static [u8] {
        LINE_BREAK.as_bytes()
    }

    /// Append a complete file part with `payload` to `out`.
    pub fn encode_file_into(&self, out: &mut Vec<u8>, file: &UploadFile, payload: &[u8]) {
        self.encode_file_header_into(out, file);
        out.extend_from_slice(payload);
        out.extend_from_slice(self.file_trailer());
    }

    /// Render a complete file part with `payload`.
    #[must_use]
    pub fn file_part(&self, file: &UploadFile, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_file_into(&mut out, file, payload);
        out
    }

    /// Bytes of framing around a file's payload (header plus trailer).
    #[must_use]
    pub fn framing_len(&self, file: &UploadFile) -> u64 {
        (self.file_header(file).len() + self.file_trailer().len()) as u64
    }

    /// Turn a file into the three sources of its part: header, payload,
    /// trailer. A streamed payload is held to the file's declared size.
    #[must_use]
    pub fn file_sources(&self, file: UploadFile) -> [ByteSource; 3] {
        let header = self.file_header(&file);
        [
            ByteSource::buffered(header),
            file.into_source(),
            ByteSource::buffered(self.file_trailer().to_vec()),
        ]
    }

    /// Append the closing boundary to `out`.
    pub fn encode_footer_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--");
        out.extend_from_slice(LINE_BREAK.as_bytes());
    }

    /// Render the closing boundary, `--{boundary}--\r\n`.
    #[must_use]
    pub fn footer(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_footer_into(&mut out);
        out
    }

    fn push_boundary_line(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(LINE_BREAK.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Readable;
    use std::io::Cursor;

    #[test]
    fn parameter_part_layout() {
        let encoder = PartEncoder::new("B1");
        let part = encoder.parameter_part(&FormParameter::new("name", "hello"));
        assert_eq!(
            part,
            b"--B1\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nhello\r\n"
        );
    }

    #[test]
    fn empty_parameter_value_still_framed() {
        let encoder = PartEncoder::new("B1");
        let part = encoder.parameter_part(&FormParameter::new("empty", ""));
        assert_eq!(
            part,
            b"--B1\r\nContent-Disposition: form-data; name=\"empty\"\r\n\r\n\r\n"
        );
    }

    #[test]
    fn file_part_layout() {
        let encoder = PartEncoder::new("B1");
        let file = UploadFile::from_bytes("file", "a.txt", b"hi".to_vec()).unwrap();
        let part = encoder.file_part(&file, b"hi");
        assert_eq!(
            part,
            concat!(
                "--B1\r\n",
                "Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n",
                "Content-Type: text/plain\r\n\r\n",
                "hi\r\n"
            )
            .as_bytes()
        );
        assert_eq!(encoder.framing_len(&file), (part.len() - 2) as u64);
    }

    #[test]
    fn footer_layout() {
        assert_eq!(PartEncoder::new("B1").footer(), b"--B1--\r\n");
        assert_eq!(PartEncoder::new("").footer(), b"----\r\n");
    }

    #[test]
    fn file_sources_concatenate_to_file_part() {
        let encoder = PartEncoder::new("XYZ");
        let file =
            UploadFile::from_reader("doc", "n.json", Cursor::new(b"{}".to_vec()), 2).unwrap();
        let expected = {
            let probe = UploadFile::from_bytes("doc", "n.json", b"{}".to_vec()).unwrap();
            encoder.file_part(&probe, b"{}")
        };

        let mut out = Vec::new();
        for mut source in encoder.file_sources(file) {
            source.open();
            let mut buf = [0u8; 3];
            loop {
                let n = source.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                out.extend_from_slice(&buf[..n]);
            }
        }
        assert_eq!(out, expected);
    }
}
