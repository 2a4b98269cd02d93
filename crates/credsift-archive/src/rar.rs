//! RAR archive extraction.
//!
//! Uses the external `unar` tool, which handles RAR4 and RAR5 (including
//! multi-volume archives) without license restrictions. Extraction happens
//! into a scoped temporary directory that is removed when the call returns.

use crate::error::ArchiveError;
use crate::path::sanitize_entry_path;
use crate::{ExtractedEntry, MAX_FILE_SIZE};
use log::warn;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Extract all files from a RAR archive.
///
/// # Errors
///
/// Returns [`ArchiveError::ToolMissing`] when `unar` is not installed,
/// [`ArchiveError::PasswordProtected`] for encrypted archives, and
/// [`ArchiveError::Corrupt`] when `unar` rejects the archive.
#[must_use = "this function returns extracted entries that should be processed"]
pub fn extract_rar(path: &Path) -> Result<Vec<ExtractedEntry>, ArchiveError> {
    if !path.exists() {
        return Err(ArchiveError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "RAR file not found",
        )));
    }

    let temp_dir = TempDir::new().map_err(ArchiveError::Io)?;

    let output = Command::new("unar")
        .arg("-o")
        .arg(temp_dir.path())
        .arg("-D") // don't create a wrapping subdirectory
        .arg("-f") // overwrite
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArchiveError::ToolMissing("unar (install with: apt install unar)".into())
            } else {
                ArchiveError::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let combined = format!("{stdout}{stderr}");
        if combined.contains("password") || combined.contains("encrypted") {
            return Err(ArchiveError::PasswordProtected);
        }
        return Err(ArchiveError::Corrupt(format!(
            "unar extraction failed: {}",
            stderr.trim()
        )));
    }

    let mut entries = Vec::new();
    read_directory_recursive(temp_dir.path(), temp_dir.path(), &mut entries)?;

    Ok(entries)
}

/// Collect every regular file under `dir` into extracted entries,
/// paths relative to `base_path`
fn read_directory_recursive(
    dir: &Path,
    base_path: &Path,
    entries: &mut Vec<ExtractedEntry>,
) -> Result<(), ArchiveError> {
    for entry in fs::read_dir(dir).map_err(ArchiveError::Io)? {
        let entry = entry.map_err(ArchiveError::Io)?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(ArchiveError::Io)?;

        if metadata.is_file() {
            let size = metadata.len();
            let raw_path = path.strip_prefix(base_path).unwrap_or(&path);
            let raw_name = raw_path.to_string_lossy().to_string();

            // unar sanitizes during extraction; sanitize again to stay
            // consistent with the in-process extractors
            let Some(sanitized) = sanitize_entry_path(raw_path) else {
                warn!("skipping invalid RAR entry path: {raw_name}");
                continue;
            };
            let name = sanitized.to_string_lossy().to_string();

            if size > MAX_FILE_SIZE {
                warn!("skipping oversized RAR entry: {name} ({size} bytes, cap {MAX_FILE_SIZE})");
                continue;
            }

            let bytes = fs::read(&path).map_err(ArchiveError::Io)?;
            entries.push(ExtractedEntry { name, bytes });
        } else if metadata.is_dir() {
            read_directory_recursive(&path, base_path, entries)?;
        }
    }

    Ok(())
}
