//! Error types for the extraction pipeline.
//!
//! Per-line and per-record conditions (malformed lines, rejected emails,
//! dedup hits) are *not* errors: they are counted and surfaced through
//! [`crate::diagnostics`]. This module only covers failures that stop
//! processing of an archive or an inner file.

use thiserror::Error;

/// Error types that can occur while running the pipeline.
///
/// Nothing below the archive-batch level aborts a whole run; callers map
/// these into batch diagnostics and continue. Only a failure to obtain the
/// archive bytes at all is escalated to the caller of the pipeline.
#[derive(Error, Debug)]
pub enum SiftError {
    /// The container signature was not recognized.
    ///
    /// The archive is skipped and the batch continues.
    #[error("unsupported container format: {0}")]
    UnsupportedFormat(String),

    /// The container was recognized but is structurally unreadable:
    /// bad CRC, truncated stream, or password-protected without a known
    /// password. The affected file is skipped and the batch continues.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// The email field failed shape validation (empty, or not exactly
    /// one `@`). The record is dropped and counted.
    #[error("invalid email: {0:?}")]
    InvalidEmail(String),

    /// File I/O error while spooling or reading extraction output.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parse error from the record parser.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Type alias for [`Result<T, SiftError>`].
pub type Result<T> = std::result::Result<T, SiftError>;
