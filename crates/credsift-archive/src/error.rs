//! Error types for archive decoding

use thiserror::Error;

/// Errors that can occur while decoding an archive container
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error while spooling or reading the working area
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream matched no known container signature and the
    /// filename extension gave no usable hint
    #[error("unsupported container format: {0}")]
    UnsupportedFormat(String),

    /// Recognized container that is structurally unreadable: bad CRC,
    /// truncated stream, malformed headers
    #[error("corrupt archive: {0}")]
    Corrupt(String),

    /// Archive is password-protected and no password is known.
    /// Classified as a corrupt-archive condition by the pipeline.
    #[error("archive is password-protected")]
    PasswordProtected,

    /// An external extraction tool is not installed (`unar` for RAR)
    #[error("extraction tool not available: {0}")]
    ToolMissing(String),
}

impl From<zip::result::ZipError> for ArchiveError {
    #[inline]
    fn from(err: zip::result::ZipError) -> Self {
        Self::Corrupt(format!("ZIP: {err}"))
    }
}
