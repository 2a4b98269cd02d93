//! End-to-end pipeline tests: in-memory archives through decode, classify,
//! parse, normalize, and dedup.

use chrono::{TimeZone, Utc};
use credsift_core::{ArchivePayload, ContainerFormat, DropReason, RecordEncoding, Stage};
use credsift_pipeline::{DedupIndex, Pipeline, RunState};
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};

/// Build an in-memory ZIP from (name, contents) pairs
fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions<()> = FileOptions::default();
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn payload(filename: &str, bytes: Vec<u8>, message_id: i64) -> ArchivePayload {
    ArchivePayload::new(
        filename,
        bytes,
        message_id,
        Utc.with_ymd_and_hms(2025, 5, 20, 7, 45, 0).unwrap(),
    )
}

fn fresh_pipeline() -> Pipeline {
    Pipeline::new(DedupIndex::new().into_handle())
}

#[test]
fn test_colon_archive_end_to_end() {
    let bytes = build_zip(&[("combo.txt", b"user@x.com:Pass123\nuser2@y.com:Pass456")]);
    let batch = fresh_pipeline().process(&payload("leak.zip", bytes, 42));

    assert_eq!(batch.state, RunState::Complete);
    assert_eq!(batch.container, Some(ContainerFormat::Zip));
    assert_eq!(batch.records.len(), 2);
    assert!(batch.diagnostics.is_empty());

    let rows = batch.rows();
    assert_eq!(rows[0].email, "user@x.com");
    assert_eq!(rows[0].domain, "x.com");
    assert_eq!(rows[0].password, "Pass123");
    assert_eq!(rows[0].file_type, ContainerFormat::Zip);
    assert_eq!(rows[0].content_type, RecordEncoding::Colon);
    assert_eq!(rows[0].filename, "combo.txt");
    assert_eq!(rows[0].source_message_id, 42);
}

#[test]
fn test_json_archive_end_to_end() {
    let bytes = build_zip(&[(
        "dump.json",
        br#"[{"email":"a@b.com","password":"p1","country":"US"}]"# as &[u8],
    )]);
    let batch = fresh_pipeline().process(&payload("dump.zip", bytes, 7));

    assert_eq!(batch.records.len(), 1);
    let record = &batch.records[0];
    assert_eq!(record.content_type, RecordEncoding::Json);
    assert_eq!(record.additional_data.as_deref(), Some("country=US"));
}

#[test]
fn test_malformed_line_reaches_diagnostics() {
    let bytes = build_zip(&[(
        "combo.txt",
        b"user@x.com:Pass123\nthis line has no delimiter at all here\nuser2@y.com:Pass456\nuser3@z.com:Pass789" as &[u8],
    )]);
    let batch = fresh_pipeline().process(&payload("leak.zip", bytes, 1));

    // The valid lines all survive
    assert_eq!(batch.records.len(), 3);

    // The malformed line is in diagnostics, never silently dropped
    let malformed: Vec<_> = batch
        .diagnostics
        .iter()
        .filter(|d| d.reason == DropReason::MalformedLine)
        .collect();
    assert_eq!(malformed.len(), 1);
    assert_eq!(malformed[0].stage, Stage::Parse);
    assert_eq!(malformed[0].inner_path.as_deref(), Some("combo.txt"));
    assert_eq!(malformed[0].detail.as_deref(), Some("line 2"));
}

#[test]
fn test_invalid_email_dropped_and_counted() {
    let bytes = build_zip(&[("combo.txt", b"not-an-email:pw\nreal@x.com:pw2")]);
    let batch = fresh_pipeline().process(&payload("leak.zip", bytes, 1));

    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].email, "real@x.com");
    assert!(batch
        .diagnostics
        .iter()
        .any(|d| d.reason == DropReason::InvalidEmail));
}

#[test]
fn test_duplicates_within_one_archive_collapse() {
    // The same credential duplicated across two inner files: first
    // occurrence wins, the rest are filtered silently
    let bytes = build_zip(&[
        ("us/combo.txt", b"dup@x.com:same" as &[u8]),
        ("eu/combo.txt", b"dup@x.com:same\nother@y.com:pw" as &[u8]),
    ]);
    let batch = fresh_pipeline().process(&payload("leak.zip", bytes, 1));

    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.records[0].filename, "us/combo.txt");
    assert_eq!(batch.duplicates_filtered, 1);
    // DedupConflict is expected steady state, not a diagnostic
    assert!(batch.diagnostics.is_empty());
}

#[test]
fn test_redundant_delivery_is_idempotent() {
    let pipeline = fresh_pipeline();
    let bytes = build_zip(&[("combo.txt", b"user@x.com:Pass123")]);

    let first = pipeline.process(&payload("leak.zip", bytes.clone(), 1));
    assert_eq!(first.records.len(), 1);

    // At-least-once delivery: same archive again yields zero new records
    let second = pipeline.process(&payload("leak.zip", bytes, 2));
    assert!(second.records.is_empty());
    assert_eq!(second.duplicates_filtered, 1);
    assert_eq!(second.state, RunState::Complete);
}

#[test]
fn test_unsupported_container_degrades_to_empty_batch() {
    let batch = fresh_pipeline().process(&payload("notes.txt", b"plain text".to_vec(), 1));

    assert_eq!(batch.state, RunState::PartialFailure);
    assert!(batch.records.is_empty());
    assert_eq!(batch.diagnostics.len(), 1);
    assert_eq!(batch.diagnostics[0].reason, DropReason::UnsupportedFormat);
    assert_eq!(batch.diagnostics[0].stage, Stage::Decode);
}

#[test]
fn test_corrupt_archive_degrades_to_empty_batch() {
    let bytes = build_zip(&[("combo.txt", b"user@x.com:Pass123")]);
    let truncated = bytes[..bytes.len() / 2].to_vec();

    let batch = fresh_pipeline().process(&payload("leak.zip", truncated, 1));
    assert_eq!(batch.state, RunState::PartialFailure);
    assert!(batch.records.is_empty());
    assert_eq!(batch.diagnostics[0].reason, DropReason::CorruptArchive);
}

#[test]
fn test_nested_archive_records_extracted() {
    let inner = build_zip(&[("inner.txt", b"nested@x.com:pw123")]);
    let outer = build_zip(&[
        ("outer.txt", b"outer@x.com:pw456" as &[u8]),
        ("inner.zip", &inner),
    ]);

    let batch = fresh_pipeline().process(&payload("outer.zip", outer, 1));
    assert_eq!(batch.state, RunState::Complete);
    assert_eq!(batch.records.len(), 2);

    let filenames: Vec<&str> = batch.records.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(filenames, vec!["outer.txt", "inner.zip/inner.txt"]);
}

#[test]
fn test_corrupt_nested_archive_is_partial_failure() {
    let mut junk_gz = vec![0x1f, 0x8b, 0x08, 0x00];
    junk_gz.extend_from_slice(b"not a deflate stream");
    let outer = build_zip(&[
        ("good.txt", b"a@b.com:pass1" as &[u8]),
        ("broken.tar.gz", &junk_gz),
    ]);

    let batch = fresh_pipeline().process(&payload("outer.zip", outer, 1));

    // Good file still yields its record; the batch is partial, not dead
    assert_eq!(batch.state, RunState::PartialFailure);
    assert_eq!(batch.records.len(), 1);
    assert!(batch
        .diagnostics
        .iter()
        .any(|d| d.reason == DropReason::CorruptArchive));
}

#[test]
fn test_freetext_fallback_still_extracts() {
    let bytes = build_zip(&[(
        "report.txt",
        b"Observed account a@b.com:hunter22 during triage\nno credentials on this line" as &[u8],
    )]);
    let batch = fresh_pipeline().process(&payload("report.zip", bytes, 1));

    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].content_type, RecordEncoding::Freetext);
    // Ambiguity is recorded, but the run is complete: records were found
    assert!(batch
        .diagnostics
        .iter()
        .any(|d| d.reason == DropReason::ClassificationAmbiguous));
    assert_eq!(batch.state, RunState::Complete);
}

#[test]
fn test_unclassifiable_empty_file_is_partial_failure() {
    let bytes = build_zip(&[("noise.txt", b"nothing credential shaped here at all" as &[u8])]);
    let batch = fresh_pipeline().process(&payload("noise.zip", bytes, 1));

    assert!(batch.records.is_empty());
    assert_eq!(batch.state, RunState::PartialFailure);
}

#[test]
fn test_concurrent_archives_share_one_fingerprint() {
    use std::sync::Arc;
    use std::thread;

    let index = DedupIndex::new().into_handle();
    let pipeline = Arc::new(Pipeline::new(index));

    let mut workers = Vec::new();
    for worker_id in 0..4 {
        let pipeline = Arc::clone(&pipeline);
        workers.push(thread::spawn(move || {
            // Each worker gets its own archive containing the same pair
            let bytes = build_zip(&[("combo.txt", b"shared@x.com:same-pass")]);
            let batch = pipeline.process(&payload(
                &format!("leak-{worker_id}.zip"),
                bytes,
                worker_id,
            ));
            batch.records.len()
        }));
    }

    let total: usize = workers
        .into_iter()
        .map(|w| w.join().expect("worker panicked"))
        .sum();
    assert_eq!(
        total, 1,
        "exactly one record accepted for a fingerprint across concurrent archives"
    );
}
