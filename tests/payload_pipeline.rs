use std::fs;
use std::io::{Cursor, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use hueying_panel::crypto;
use hueying_panel::error::PayloadError;
use hueying_panel::payload;

const KEY: &[u8; 16] = b"1234567890abcdef";

fn encode_archive(
    build: impl FnOnce(&mut ZipWriter<Cursor<Vec<u8>>>, SimpleFileOptions),
) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    build(&mut writer, opts);
    let plaintext = writer.finish().unwrap().into_inner();
    let blob = crypto::encrypt(&plaintext, KEY, &[7u8; 16]).unwrap();
    BASE64.encode(blob).into_bytes()
}

fn flat_payload(workflow_body: &[u8]) -> Vec<u8> {
    encode_archive(|writer, opts| {
        writer.add_directory("workflows/", opts).unwrap();
        writer.start_file("workflows/basic.json", opts).unwrap();
        writer.write_all(workflow_body).unwrap();
        writer.start_file("workflow_mappings.json", opts).unwrap();
        writer.write_all(b"{}").unwrap();
        writer.start_file("version.txt", opts).unwrap();
        writer.write_all(b"2024.01.01").unwrap();
    })
}

#[test]
fn extracts_flat_archive_into_working_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");
    fs::write(&payload_file, flat_payload(b"{\"nodes\":[]}")).unwrap();

    payload::extract_payload(&payload_file, &working_dir, KEY).unwrap();

    let workflow = working_dir.join("workflows").join("basic.json");
    assert_eq!(fs::read(&workflow).unwrap(), b"{\"nodes\":[]}");
    assert!(working_dir.join("workflow_mappings.json").exists());
    assert!(working_dir.join("version.txt").exists());
}

#[test]
fn re_extraction_overwrites_stale_files() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");

    fs::write(&payload_file, flat_payload(b"old")).unwrap();
    payload::extract_payload(&payload_file, &working_dir, KEY).unwrap();

    fs::write(&payload_file, flat_payload(b"new")).unwrap();
    payload::extract_payload(&payload_file, &working_dir, KEY).unwrap();

    let workflow = working_dir.join("workflows").join("basic.json");
    assert_eq!(fs::read(&workflow).unwrap(), b"new");
}

#[test]
fn descends_into_payload_wrapper_when_marker_is_top_level() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");
    let raw = encode_archive(|writer, opts| {
        writer.add_directory("workflows/", opts).unwrap();
        writer.add_directory("payload/", opts).unwrap();
        writer
            .start_file("payload/workflow_mappings.json", opts)
            .unwrap();
        writer.write_all(b"{\"wrapped\":true}").unwrap();
    });
    fs::write(&payload_file, raw).unwrap();

    payload::extract_payload(&payload_file, &working_dir, KEY).unwrap();

    // Content comes from inside payload/, not the archive root.
    assert_eq!(
        fs::read(working_dir.join("workflow_mappings.json")).unwrap(),
        b"{\"wrapped\":true}"
    );
    assert!(!working_dir.join("payload").exists());
}

#[test]
fn wrapper_without_top_level_marker_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");
    let raw = encode_archive(|writer, opts| {
        writer.add_directory("payload/", opts).unwrap();
        writer.add_directory("payload/workflows/", opts).unwrap();
        writer.start_file("payload/workflows/a.json", opts).unwrap();
        writer.write_all(b"{}").unwrap();
    });
    fs::write(&payload_file, raw).unwrap();

    let err = payload::extract_payload(&payload_file, &working_dir, KEY).unwrap_err();
    assert!(matches!(err, PayloadError::MissingMarker));
    assert!(!working_dir.join("workflows").exists());
}

#[test]
fn archive_without_any_marker_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");
    let raw = encode_archive(|writer, opts| {
        writer.start_file("readme.txt", opts).unwrap();
        writer.write_all(b"not a workflow drop").unwrap();
    });
    fs::write(&payload_file, raw).unwrap();

    let err = payload::extract_payload(&payload_file, &working_dir, KEY).unwrap_err();
    assert!(matches!(err, PayloadError::MissingMarker));
}

#[test]
fn failed_extraction_does_not_mark_the_workspace_as_populated() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");
    let raw = encode_archive(|writer, opts| {
        writer.start_file("readme.txt", opts).unwrap();
        writer.write_all(b"no markers here").unwrap();
    });
    fs::write(&payload_file, raw).unwrap();

    let err = payload::extract_payload(&payload_file, &working_dir, KEY).unwrap_err();
    assert!(matches!(err, PayloadError::MissingMarker));

    // No staging residue survives the failure, and a later lazy init
    // must still refuse the archive instead of trusting the cache.
    assert!(!working_dir.join(".payload_tmp").exists());
    let err = payload::init_payload(&payload_file, &working_dir, KEY).unwrap_err();
    assert!(matches!(err, PayloadError::MissingMarker));
}

#[test]
fn tampered_payload_is_rejected_before_extraction() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");

    let mut blob = crypto::encrypt(b"plaintext", KEY, &[7u8; 16]).unwrap();
    blob[20] ^= 0x01;
    fs::write(&payload_file, BASE64.encode(blob)).unwrap();

    let err = payload::extract_payload(&payload_file, &working_dir, KEY).unwrap_err();
    assert!(matches!(err, PayloadError::Integrity));
    assert!(!working_dir.exists());
}

#[test]
fn init_payload_skips_populated_working_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let working_dir = tmp.path().join("work");
    fs::create_dir_all(&working_dir).unwrap();
    fs::write(working_dir.join("workflow_mappings.json"), b"{}").unwrap();

    // Payload file does not exist, but the populated cache wins.
    let missing = tmp.path().join("missing.b64");
    payload::init_payload(&missing, &working_dir, KEY).unwrap();
}

#[test]
fn init_payload_requires_payload_file_for_empty_workspace() {
    let tmp = tempfile::tempdir().unwrap();
    let working_dir = tmp.path().join("work");
    let missing = tmp.path().join("missing.b64");

    let err = payload::init_payload(&missing, &working_dir, KEY).unwrap_err();
    assert!(matches!(err, PayloadError::InvalidPayload(_)));
}

#[test]
fn init_payload_populates_empty_working_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let payload_file = tmp.path().join("payload.b64");
    let working_dir = tmp.path().join("work");
    fs::create_dir_all(&working_dir).unwrap();
    fs::write(&payload_file, flat_payload(b"{}")).unwrap();

    payload::init_payload(&payload_file, &working_dir, KEY).unwrap();
    assert!(working_dir.join("workflows").join("basic.json").exists());
}
