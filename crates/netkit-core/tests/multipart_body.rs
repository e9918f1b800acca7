//! End-to-end body construction tests.

use std::io::{Cursor, Read, Write};

use netkit_core::{
    AggregateStream, BodyMode, ByteSource, FormData, FormParameter, MultipartBodyBuilder,
    StreamError, StreamHandle, StreamStatus, UploadError, UploadFile,
};
use proptest::prelude::*;

fn read_in_chunks(stream: &mut AggregateStream, chunk: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk];
    loop {
        let n = stream.read(&mut buf).expect("read");
        if n == 0 {
            return out;
        }
        out.extend_from_slice(&buf[..n]);
    }
}

// =============================================================================
// Disk-backed uploads
// =============================================================================

#[test]
fn disk_file_streams_without_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    let mut handle = std::fs::File::create(&path).unwrap();
    let row = b"id,name,score\n";
    for _ in 0..4096 {
        handle.write_all(row).unwrap();
    }
    drop(handle);

    let file = UploadFile::from_path("report", &path).unwrap();
    assert_eq!(file.name(), "report.csv");
    assert_eq!(file.mime_type().as_str(), "text/csv");
    assert_eq!(file.size(), (row.len() * 4096) as u64);
    assert!(file.is_streamed());

    let form = FormData::with_boundary(
        "DISK",
        vec![FormParameter::new("kind", "csv")],
        vec![file],
    );
    let body = MultipartBodyBuilder::new().build_form(form);
    assert_eq!(body.mode(), BodyMode::Streamed);
    let declared = body.content_length();

    let mut stream = body.into_content().into_stream();
    let bytes = read_in_chunks(&mut stream, 1000);
    assert_eq!(bytes.len() as u64, declared);
    assert_eq!(stream.status(), StreamStatus::Closed);

    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("--DISK\r\nContent-Disposition: form-data; name=\"kind\""));
    assert!(text.contains("filename=\"report.csv\"\r\nContent-Type: text/csv\r\n\r\nid,name"));
    assert!(text.ends_with("score\n\r\n--DISK--\r\n"));
}

#[test]
fn disk_file_removed_before_read_fails_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    std::fs::write(&path, b"soon deleted").unwrap();

    let file = UploadFile::from_path("doc", &path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let body = MultipartBodyBuilder::new().build("GONE", &[FormParameter::new("a", "b")], vec![file]);
    let mut stream = body.into_content().into_stream();
    let mut buf = [0u8; 4096];
    let mut first_error = None;
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                first_error = Some(err);
                break;
            }
        }
    }

    let err = first_error.expect("missing file must surface as an error");
    assert!(matches!(
        StreamError::from_io(&err),
        Some(StreamError::UnderlyingSource { .. })
    ));
    assert_eq!(stream.status(), StreamStatus::Error);
    assert!(stream.read(&mut buf).is_err());
}

#[test]
fn disk_file_grown_after_upload_created_fails_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    std::fs::write(&path, b"ab").unwrap();

    let file = UploadFile::from_path("log", &path).unwrap();
    assert_eq!(file.size(), 2);
    std::fs::write(&path, b"abcdefghij").unwrap();

    let body = MultipartBodyBuilder::new().build("GROW", &[], vec![file]);
    let err = body.into_bytes().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    assert!(matches!(
        StreamError::from_io(&err),
        Some(StreamError::UnderlyingSource { index: 1, .. })
    ));
}

#[test]
fn reader_longer_than_declared_size_fails_stream() {
    let file = UploadFile::from_reader("f", "a.txt", Cursor::new(b"1234567".to_vec()), 2).unwrap();
    let body = MultipartBodyBuilder::new().build("LONG", &[], vec![file]);
    assert_eq!(body.content_length(), 110);

    let mut stream = body.into_content().into_stream();
    let err = stream.read_to_vec().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    assert_eq!(stream.status(), StreamStatus::Error);
}

#[test]
fn reader_shorter_than_declared_size_fails_stream() {
    let file = UploadFile::from_reader("f", "a.txt", Cursor::new(b"12".to_vec()), 9).unwrap();
    let body = MultipartBodyBuilder::new().build("SHORT", &[], vec![file]);

    let mut stream = body.into_content().into_stream();
    let err = stream.read_to_vec().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    assert!(stream.bytes_delivered() < 9);
}

#[test]
fn directory_is_not_an_upload() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("folder.txt");
    std::fs::create_dir(&sub).unwrap();
    let err = UploadFile::from_path("dir", &sub).unwrap_err();
    assert!(matches!(err, UploadError::FileMetadataUnavailable { .. }));
}

#[test]
fn missing_path_is_metadata_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = UploadFile::from_path("x", dir.path().join("nope.txt")).unwrap_err();
    assert!(matches!(err, UploadError::FileMetadataUnavailable { .. }));
}

// =============================================================================
// Chained streams
// =============================================================================

#[test]
fn aggregate_stream_drives_std_read_to_end() {
    let mut stream: AggregateStream = vec![
        ByteSource::buffered(b"alpha ".to_vec()),
        ByteSource::buffered(Vec::new()),
        ByteSource::streaming(StreamHandle::reader(Cursor::new(b"beta ".to_vec()))),
        ByteSource::buffered(b"gamma".to_vec()),
    ]
    .into_iter()
    .collect();

    let mut out = String::new();
    Read::read_to_string(&mut stream, &mut out).unwrap();
    assert_eq!(out, "alpha beta gamma");
    assert_eq!(stream.bytes_delivered(), 16);
}

#[test]
fn closed_stream_rejects_append() {
    let mut stream = AggregateStream::new(vec![ByteSource::buffered(b"x".to_vec())]);
    stream.open();
    stream.close();
    let err = stream.append(ByteSource::buffered(b"y".to_vec())).unwrap_err();
    assert_eq!(
        err,
        StreamError::AppendAfterEnd {
            status: StreamStatus::Closed
        }
    );
}

// =============================================================================
// Properties
// =============================================================================

fn parameter_strategy() -> impl Strategy<Value = (String, String)> {
    ("[a-z]{1,8}", "[ -~]{0,40}")
}

fn file_strategy() -> impl Strategy<Value = (String, Vec<u8>)> {
    (
        "[a-z]{1,8}",
        prop::collection::vec(any::<u8>(), 0..300),
    )
}

proptest! {
    #[test]
    fn streamed_body_matches_buffered_body(
        params in prop::collection::vec(parameter_strategy(), 0..4),
        files in prop::collection::vec(file_strategy(), 0..4),
    ) {
        let params: Vec<FormParameter> =
            params.into_iter().map(FormParameter::from).collect();

        let mut buffered_files: Vec<UploadFile> = files
            .iter()
            .map(|(key, data)| UploadFile::from_bytes(key.as_str(), "data.bin", data.clone()).unwrap())
            .collect();
        let mut streamed_files: Vec<UploadFile> = files
            .iter()
            .map(|(key, data)| UploadFile::from_bytes(key.as_str(), "data.bin", data.clone()).unwrap())
            .collect();
        streamed_files.push(
            UploadFile::from_reader("tail", "tail.bin", Cursor::new(Vec::new()), 0).unwrap(),
        );
        buffered_files.push(UploadFile::from_bytes("tail", "tail.bin", Vec::new()).unwrap());

        let builder = MultipartBodyBuilder::new();
        let buffered = builder.build("PROP", &params, buffered_files);
        let streamed = builder.build("PROP", &params, streamed_files);
        prop_assert_eq!(buffered.mode(), BodyMode::Buffered);
        prop_assert_eq!(streamed.mode(), BodyMode::Streamed);
        prop_assert_eq!(buffered.content_length(), streamed.content_length());

        let expected = buffered.into_bytes().unwrap();
        prop_assert_eq!(expected.len() as u64, streamed.content_length());
        prop_assert_eq!(streamed.into_bytes().unwrap(), expected);
    }

    #[test]
    fn chunk_size_never_changes_output(
        parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..8),
        chunk in 1usize..50,
    ) {
        let expected: Vec<u8> = parts.concat();
        let mut stream: AggregateStream = parts
            .into_iter()
            .map(ByteSource::from)
            .collect();
        prop_assert_eq!(read_in_chunks(&mut stream, chunk), expected);
        prop_assert_eq!(stream.status(), StreamStatus::Closed);
    }

    #[test]
    fn unknown_extensions_always_fail(ext in "zz[a-z]{6}") {
        let name = format!("file.{ext}");
        let result = UploadFile::from_bytes("k", name, b"data".to_vec());
        let is_unknown_mime = matches!(result, Err(UploadError::UnknownMimeType { .. }));
        prop_assert!(is_unknown_mime);
    }
}
