//! # credsift-archive — Container decoding for credsift
//!
//! Decodes the archive payloads the pipeline ingests: ZIP, TAR (plain,
//! gzip, bzip2), 7Z, and RAR. The entry point is [`decode`], which takes
//! the raw bytes plus the delivered filename, detects the container by
//! magic bytes (extension only as a fallback), extracts every inner file,
//! and recurses into nested archives up to a fixed depth budget.
//!
//! # Behavior
//!
//! - **Detection**: signatures first; mislabeled uploads are common, so the
//!   extension is never trusted when the signature disagrees.
//! - **Working area**: each extraction spools into a scoped [`tempfile::TempDir`]
//!   that is removed on every exit path, success or failure.
//! - **Nested archives**: decoded recursively up to [`MAX_NESTING_DEPTH`];
//!   anything deeper is surfaced as an unparsed inner file flagged
//!   `depth_exceeded` rather than silently dropped.
//! - **Degradation**: oversized and traversal-path entries are skipped with
//!   a warning; a corrupt *nested* archive becomes a diagnostic, not a
//!   failure of the whole decode.

pub mod detect;
pub mod error;
pub mod path;
pub mod rar;
pub mod sevenz;
pub mod tar;
pub mod zip;

use credsift_core::{ContainerFormat, Diagnostic, DropReason, InnerFile, Stage};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

pub use error::ArchiveError;

/// Maximum size for a single file within an archive (100 MB).
///
/// Entries above this are skipped during extraction to bound memory against
/// zip bombs and oversized dumps.
pub const MAX_FILE_SIZE: u64 = 100_000_000;

/// Maximum nesting depth for recursive archive extraction.
///
/// The delivered archive counts as depth 1; an archive found inside it
/// decodes at depth 2, and so on. Archives that would decode beyond this
/// budget are surfaced unparsed with a `depth_exceeded` flag.
pub const MAX_NESTING_DEPTH: usize = 3;

/// One file pulled out of a single container, before nested-archive
/// handling. Produced by the per-format extractors.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExtractedEntry {
    /// Sanitized entry path within its container
    pub name: String,
    /// Entry contents
    pub bytes: Vec<u8>,
}

/// Result of decoding one archive payload
#[derive(Debug)]
pub struct DecodeOutcome {
    /// Detected container format of the top-level archive
    pub container: ContainerFormat,
    /// Inner files in container order, nested archives flattened in place
    pub files: Vec<InnerFile>,
    /// Per-entry degradations encountered during decoding
    pub diagnostics: Vec<Diagnostic>,
}

/// Decode an archive payload into its inner files.
///
/// # Errors
///
/// Returns [`ArchiveError::UnsupportedFormat`] when neither the byte
/// signature nor the filename identifies a supported container, and
/// [`ArchiveError::Corrupt`] / [`ArchiveError::PasswordProtected`] when the
/// *top-level* container is recognized but unreadable. Failures inside
/// nested archives degrade to diagnostics instead.
#[must_use = "this function returns decoded inner files that should be processed"]
pub fn decode(filename: &str, bytes: &[u8]) -> Result<DecodeOutcome, ArchiveError> {
    let container = detect::detect_container(filename, bytes)
        .ok_or_else(|| ArchiveError::UnsupportedFormat(filename.to_string()))?;

    let mut files = Vec::new();
    let mut diagnostics = Vec::new();

    decode_at_depth(
        filename,
        container,
        bytes,
        "",
        1,
        &mut files,
        &mut diagnostics,
    )?;

    Ok(DecodeOutcome {
        container,
        files,
        diagnostics,
    })
}

/// Extract one container and recurse into nested archives, threading an
/// explicit depth counter rather than relying on unbounded call-stack
/// recursion.
#[allow(clippy::too_many_arguments)]
fn decode_at_depth(
    archive_filename: &str,
    container: ContainerFormat,
    bytes: &[u8],
    path_prefix: &str,
    depth: usize,
    files: &mut Vec<InnerFile>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), ArchiveError> {
    let entries = extract_container(container, archive_filename, bytes)?;

    for entry in entries {
        let full_path = if path_prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{path_prefix}/{}", entry.name)
        };

        let nested = detect::sniff_container(&entry.bytes);
        match nested {
            Some(kind) if depth >= MAX_NESTING_DEPTH => {
                // Budget exhausted: surface unparsed instead of dropping
                diagnostics.push(Diagnostic::inner_file(
                    Stage::Decode,
                    full_path.clone(),
                    DropReason::DepthExceeded,
                    format!("nested {kind} archive at depth {}", depth + 1),
                ));
                files.push(InnerFile {
                    path: full_path,
                    bytes: entry.bytes,
                    archive_filename: archive_filename.to_string(),
                    depth_exceeded: true,
                });
            }
            Some(kind) => {
                if let Err(e) = decode_at_depth(
                    archive_filename,
                    kind,
                    &entry.bytes,
                    &full_path,
                    depth + 1,
                    files,
                    diagnostics,
                ) {
                    // A corrupt nested archive skips that entry only
                    diagnostics.push(Diagnostic::inner_file(
                        Stage::Decode,
                        full_path,
                        DropReason::CorruptArchive,
                        e.to_string(),
                    ));
                }
            }
            None => {
                files.push(InnerFile {
                    path: full_path,
                    bytes: entry.bytes,
                    archive_filename: archive_filename.to_string(),
                    depth_exceeded: false,
                });
            }
        }
    }

    Ok(())
}

/// Spool payload bytes into a scoped working area and run the per-format
/// extractor. The `TempDir` drop removes the area on every exit path.
fn extract_container(
    container: ContainerFormat,
    filename: &str,
    bytes: &[u8],
) -> Result<Vec<ExtractedEntry>, ArchiveError> {
    let workdir = TempDir::new().map_err(ArchiveError::Io)?;

    let spool_name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("payload.bin");
    let spool_path = workdir.path().join(spool_name);

    let mut spool = std::fs::File::create(&spool_path)?;
    spool.write_all(bytes)?;
    spool.flush()?;
    drop(spool);

    match container {
        ContainerFormat::Zip => zip::extract_zip(&spool_path),
        ContainerFormat::Tar => tar::extract_tar(&spool_path),
        ContainerFormat::SevenZ => sevenz::extract_sevenz(&spool_path),
        ContainerFormat::Rar => rar::extract_rar(&spool_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use ::zip::write::{FileOptions, ZipWriter};

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

    #[test]
    fn test_decode_flat_zip() {
        let bytes = build_zip(&[
            ("combo.txt", b"user@x.com:Pass123"),
            ("logs/eu.txt", b"user2@y.com:Pass456"),
        ]);

        let outcome = decode("leak.zip", &bytes).expect("decode failed");
        assert_eq!(outcome.container, ContainerFormat::Zip);
        assert_eq!(outcome.files.len(), 2);
        assert!(outcome.diagnostics.is_empty());

        assert_eq!(outcome.files[0].path, "combo.txt");
        assert_eq!(outcome.files[0].archive_filename, "leak.zip");
        assert!(!outcome.files[0].depth_exceeded);
    }

    #[test]
    fn test_decode_mislabeled_extension() {
        // ZIP bytes delivered under a .rar name: the signature wins
        let bytes = build_zip(&[("combo.txt", b"a@b.com:pw")]);
        let outcome = decode("mislabeled.rar", &bytes).expect("decode failed");
        assert_eq!(outcome.container, ContainerFormat::Zip);
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn test_decode_unsupported_format() {
        let result = decode("notes.txt", b"just some text");
        assert!(matches!(result, Err(ArchiveError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_decode_nested_zip_recurses() {
        let inner = build_zip(&[("inner.txt", b"nested@x.com:pw1")]);
        let outer = build_zip(&[
            ("first.txt", b"outer@x.com:pw2"),
            ("inner.zip", &inner),
        ]);

        let outcome = decode("outer.zip", &outer).expect("decode failed");
        let paths: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["first.txt", "inner.zip/inner.txt"]);
        assert!(outcome.files.iter().all(|f| !f.depth_exceeded));
    }

    #[test]
    fn test_decode_depth_budget_exhausted() {
        // outer.zip (1) -> mid.zip (2) -> deep.zip (3) -> deepest.zip,
        // which would decode at depth 4 and is surfaced unparsed instead
        let deepest = build_zip(&[("deepest.txt", b"deepest@x.com:pw")]);
        let deep = build_zip(&[("deepest.zip", &deepest)]);
        let mid = build_zip(&[("deep.zip", &deep)]);
        let outer = build_zip(&[("mid.zip", &mid)]);

        let outcome = decode("outer.zip", &outer).expect("decode failed");

        assert_eq!(outcome.files.len(), 1);
        let flagged = &outcome.files[0];
        assert_eq!(flagged.path, "mid.zip/deep.zip/deepest.zip");
        assert!(flagged.depth_exceeded);
        assert_eq!(flagged.bytes, deepest);

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].reason, DropReason::DepthExceeded);
    }

    #[test]
    fn test_decode_three_levels_fully_decoded() {
        // Exactly at the budget: three nested levels all decode
        let deep = build_zip(&[("deep.txt", b"deep@x.com:pw")]);
        let mid = build_zip(&[("deep.zip", &deep)]);
        let outer = build_zip(&[("mid.zip", &mid)]);

        let outcome = decode("outer.zip", &outer).expect("decode failed");
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].path, "mid.zip/deep.zip/deep.txt");
        assert!(!outcome.files[0].depth_exceeded);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_decode_corrupt_nested_archive_degrades() {
        // Valid gzip magic followed by junk: detected as a nested TAR,
        // fails to decode, must degrade to a diagnostic
        let mut junk_gz = vec![0x1f, 0x8b, 0x08, 0x00];
        junk_gz.extend_from_slice(b"definitely not a deflate stream");
        let outer = build_zip(&[
            ("good.txt", b"a@b.com:pw"),
            ("broken.tar.gz", &junk_gz),
        ]);

        let outcome = decode("outer.zip", &outer).expect("decode failed");
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].path, "good.txt");

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].reason, DropReason::CorruptArchive);
        assert_eq!(
            outcome.diagnostics[0].inner_path.as_deref(),
            Some("broken.tar.gz")
        );
    }

    #[test]
    fn test_decode_truncated_zip_is_corrupt() {
        let bytes = build_zip(&[("combo.txt", b"user@x.com:Pass123")]);
        let truncated = &bytes[..bytes.len() / 2];

        let result = decode("leak.zip", truncated);
        assert!(
            matches!(result, Err(ArchiveError::Corrupt(_))),
            "truncated top-level ZIP must be corrupt, got {result:?}"
        );
    }
}
