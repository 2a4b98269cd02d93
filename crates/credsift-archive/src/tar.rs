//! TAR archive extraction (uncompressed, gzip, and bzip2 compressed)

use crate::error::ArchiveError;
use crate::path::sanitize_entry_path;
use crate::{ExtractedEntry, MAX_FILE_SIZE};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use log::warn;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tar::Archive;

/// Gzip magic bytes (RFC 1952)
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Bzip2 magic bytes `BZ`
const BZIP2_MAGIC: [u8; 2] = [0x42, 0x5a];

/// Compression wrapper detected around a TAR stream.
///
/// Defaults to `None` (uncompressed TAR).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TarCompression {
    /// Uncompressed TAR
    #[default]
    None,
    /// Gzip compressed (.tar.gz, .tgz)
    Gzip,
    /// Bzip2 compressed (.tar.bz2, .tbz2)
    Bzip2,
}

impl TarCompression {
    /// Detect compression from the stream's leading magic bytes.
    ///
    /// Preferred over the extension: the spool file name comes from an
    /// untrusted upstream label.
    #[inline]
    #[must_use = "returns the detected compression type"]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 4 {
            return Self::None;
        }
        if bytes[..2] == GZIP_MAGIC {
            return Self::Gzip;
        }
        if bytes[..2] == BZIP2_MAGIC {
            return Self::Bzip2;
        }
        Self::None
    }
}

impl std::fmt::Display for TarCompression {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        };
        write!(f, "{s}")
    }
}

/// Extract all files from a TAR archive, sniffing the compression wrapper
/// from the stream itself.
///
/// # Errors
///
/// Returns [`ArchiveError::Corrupt`] for truncated or malformed streams.
#[must_use = "this function returns extracted entries that should be processed"]
pub fn extract_tar(path: &Path) -> Result<Vec<ExtractedEntry>, ArchiveError> {
    let mut header = [0u8; 4];
    {
        let mut probe = File::open(path)?;
        // Short files yield a partial header; from_magic_bytes handles that
        let _ = probe.read(&mut header)?;
    }
    let compression = TarCompression::from_magic_bytes(&header);

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();

    match compression {
        TarCompression::None => {
            let mut archive = Archive::new(reader);
            extract_entries(&mut archive, &mut entries)?;
        }
        TarCompression::Gzip => {
            let gz = GzDecoder::new(reader);
            let mut archive = Archive::new(gz);
            extract_entries(&mut archive, &mut entries)?;
        }
        TarCompression::Bzip2 => {
            let bz = BzDecoder::new(reader);
            let mut archive = Archive::new(bz);
            extract_entries(&mut archive, &mut entries)?;
        }
    }

    Ok(entries)
}

/// Walk TAR entries, skipping non-files, traversal paths, macOS resource
/// forks, and oversized entries
fn extract_entries<R: Read>(
    archive: &mut Archive<R>,
    entries: &mut Vec<ExtractedEntry>,
) -> Result<(), ArchiveError> {
    let iter = archive
        .entries()
        .map_err(|e| ArchiveError::Corrupt(format!("TAR: {e}")))?;

    for entry in iter {
        let mut entry = entry.map_err(|e| ArchiveError::Corrupt(format!("TAR entry: {e}")))?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw_path = entry
            .path()
            .map_err(|e| ArchiveError::Corrupt(format!("TAR path: {e}")))?
            .to_path_buf();
        let size = entry
            .header()
            .size()
            .map_err(|e| ArchiveError::Corrupt(format!("TAR header: {e}")))?;

        let Some(sanitized) = sanitize_entry_path(&raw_path) else {
            let raw_name = raw_path.to_string_lossy();
            warn!("skipping invalid TAR entry path: {raw_name}");
            continue;
        };
        let name = sanitized.to_string_lossy().to_string();

        // macOS resource forks carry no credential content
        if sanitized
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("._"))
        {
            continue;
        }

        if size > MAX_FILE_SIZE {
            warn!("skipping oversized TAR entry: {name} ({size} bytes, cap {MAX_FILE_SIZE})");
            continue;
        }

        // Safe: size already checked against MAX_FILE_SIZE (100MB < usize::MAX)
        let mut bytes = Vec::with_capacity(
            size.try_into()
                .expect("size within bounds after MAX_FILE_SIZE check"),
        );
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::Corrupt(format!("TAR entry {name}: {e}")))?;

        entries.push(ExtractedEntry { name, bytes });
    }

    Ok(())
}
