//! 7Z archive extraction.
//!
//! Supports the compression methods `sevenz-rust` decodes without the AES
//! feature: LZMA, LZMA2, BZIP2, ZSTD, and Copy. Encrypted archives are
//! reported as password-protected.

use crate::error::ArchiveError;
use crate::path::sanitize_entry_path;
use crate::{ExtractedEntry, MAX_FILE_SIZE};
use log::warn;
use sevenz_rust::{Password, SevenZReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Extract all files from a 7Z archive.
///
/// # Errors
///
/// Returns [`ArchiveError::PasswordProtected`] for encrypted archives and
/// [`ArchiveError::Corrupt`] for structurally invalid ones.
#[must_use = "this function returns extracted entries that should be processed"]
pub fn extract_sevenz(path: &Path) -> Result<Vec<ExtractedEntry>, ArchiveError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    let reader = BufReader::new(file);

    // Empty password: the reader errors out if one is actually required
    let password = Password::empty();
    let mut sz = SevenZReader::new(reader, len, password).map_err(classify_sevenz_error)?;

    let mut entries = Vec::new();

    sz.for_each_entries(|entry, reader| {
        if entry.is_directory() {
            return Ok(true);
        }

        let raw_name = entry.name().to_string();
        let size = entry.size();

        let Some(sanitized) = sanitize_entry_path(Path::new(&raw_name)) else {
            warn!("skipping invalid 7Z entry path: {raw_name}");
            return Ok(true);
        };
        let name = sanitized.to_string_lossy().to_string();

        if size > MAX_FILE_SIZE {
            warn!("skipping oversized 7Z entry: {name} ({size} bytes, cap {MAX_FILE_SIZE})");
            return Ok(true);
        }

        let mut bytes = Vec::new();
        match reader.read_to_end(&mut bytes) {
            Ok(_) => {
                entries.push(ExtractedEntry { name, bytes });
            }
            Err(e) => {
                // One unreadable entry does not fail the archive
                warn!("failed to read 7Z entry {name}: {e}");
            }
        }
        Ok(true)
    })
    .map_err(classify_sevenz_error)?;

    Ok(entries)
}

/// Map a `sevenz-rust` error to the pipeline taxonomy
fn classify_sevenz_error(err: sevenz_rust::Error) -> ArchiveError {
    let err_str = err.to_string();
    if err_str.contains("password") || err_str.contains("encrypted") {
        ArchiveError::PasswordProtected
    } else {
        ArchiveError::Corrupt(format!("7Z: {err}"))
    }
}
