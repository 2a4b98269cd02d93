//! ZIP archive extraction

use crate::error::ArchiveError;
use crate::path::sanitize_entry_path;
use crate::{ExtractedEntry, MAX_FILE_SIZE};
use log::warn;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

/// Extract all files from a ZIP archive.
///
/// Directories are skipped; entries with traversal-attempt paths or sizes
/// beyond [`MAX_FILE_SIZE`] are skipped with a warning rather than failing
/// the archive.
///
/// # Errors
///
/// Returns [`ArchiveError::Corrupt`] when the archive is structurally
/// invalid (truncated stream, bad central directory, CRC mismatch on read)
/// and [`ArchiveError::PasswordProtected`] when any entry is encrypted.
#[must_use = "this function returns extracted entries that should be processed"]
pub fn extract_zip(path: &Path) -> Result<Vec<ExtractedEntry>, ArchiveError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader)?;

    let mut entries = Vec::new();

    for i in 0..archive.len() {
        let mut zip_file = archive.by_index(i)?;

        if zip_file.is_dir() {
            continue;
        }

        if zip_file.encrypted() {
            return Err(ArchiveError::PasswordProtected);
        }

        let raw_name = zip_file.name().to_string();
        let size = zip_file.size();

        let Some(sanitized) = sanitize_entry_path(Path::new(&raw_name)) else {
            warn!("skipping invalid ZIP entry path: {raw_name}");
            continue;
        };
        let name = sanitized.to_string_lossy().to_string();

        if size > MAX_FILE_SIZE {
            warn!("skipping oversized ZIP entry: {name} ({size} bytes, cap {MAX_FILE_SIZE})");
            continue;
        }

        // Safe: size already checked against MAX_FILE_SIZE (100MB < usize::MAX)
        let mut bytes = Vec::with_capacity(
            size.try_into()
                .expect("size within bounds after MAX_FILE_SIZE check"),
        );
        zip_file
            .read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::Corrupt(format!("ZIP entry {name}: {e}")))?;

        entries.push(ExtractedEntry { name, bytes });
    }

    Ok(entries)
}
