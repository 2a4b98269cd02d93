//! Canonical record types flowing through the pipeline.
//!
//! `ArchivePayload` arrives from the upstream message-stream collaborator,
//! `InnerFile` and `RawRecord` are transient stage outputs, and
//! `CredentialRecord` is the immutable canonical shape handed to the
//! storage collaborator as an [`OutputRow`].

use crate::error::SiftError;
use crate::format::{ContainerFormat, RecordEncoding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Compute the dedup identity for an email/password pair.
///
/// Case-insensitive SHA-256 over `email + "\x00" + password`: two records
/// with the same fingerprint are the same fact regardless of source. The
/// NUL separator keeps `("ab", "c")` and `("a", "bc")` distinct.
#[must_use = "returns the dedup fingerprint for the pair"]
pub fn fingerprint(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.to_lowercase().as_bytes());
    hasher.update(b"\x00");
    hasher.update(password.to_lowercase().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A compressed archive delivered by the message-stream collaborator.
///
/// Owned exclusively by one pipeline run; the byte buffer may be discarded
/// once all inner files are extracted.
#[derive(Debug, Clone)]
pub struct ArchivePayload {
    /// Filename as delivered (may be mislabeled; never trusted alone)
    pub filename: String,
    /// Raw archive bytes
    pub bytes: Vec<u8>,
    /// Identifier of the originating message
    pub source_message_id: i64,
    /// When the archive was received upstream
    pub received_at: DateTime<Utc>,
}

impl ArchivePayload {
    /// Create a payload from its parts
    #[must_use = "constructs a payload that should be fed to the pipeline"]
    pub fn new(
        filename: impl Into<String>,
        bytes: Vec<u8>,
        source_message_id: i64,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            source_message_id,
            received_at,
        }
    }
}

/// One file extracted from an archive.
///
/// Transient: produced by the archive decoder, consumed by the sniffer,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerFile {
    /// Path of the entry within the archive (sanitized, nested paths are
    /// `outer.zip/inner.txt`-style)
    pub path: String,
    /// Entry contents
    pub bytes: Vec<u8>,
    /// Filename of the containing archive
    pub archive_filename: String,
    /// Set when this entry is itself an archive nested deeper than the
    /// recursion budget and was surfaced unparsed instead of silently
    /// dropped
    pub depth_exceeded: bool,
}

/// A parsed-but-unvalidated field tuple.
///
/// Fields are positional: `[email, password, extra...]`. Semantic meaning is
/// assigned only at the normalizer boundary; a missing key in a JSON record
/// is `None` here rather than being dropped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Encoding the record was parsed under
    pub encoding: RecordEncoding,
    /// Ordered field values; `None` marks an expected-but-absent field
    pub fields: Vec<Option<String>>,
    /// 1-based line number in the source file (element index for JSON
    /// arrays)
    pub source_line: usize,
}

/// Provenance stamped onto every record by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Inner-file path the record came from
    pub filename: String,
    /// Container format of the originating archive
    pub container: ContainerFormat,
    /// Identifier of the originating message
    pub source_message_id: i64,
    /// Timestamp of the originating archive delivery
    pub timestamp: DateTime<Utc>,
}

/// The canonical, persisted credential record.
///
/// Immutable once constructed. Invariants enforced by [`CredentialRecord::new`]:
/// `email` is non-empty and contains exactly one `@`; `domain` is the
/// lower-cased substring after the `@`; `fingerprint` is the
/// case-insensitive hash of the email/password pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Email address, original casing preserved
    pub email: String,
    /// Lower-cased domain part of the email
    pub domain: String,
    /// Password, verbatim (passwords are case-sensitive)
    pub password: String,
    /// Extra fields beyond email/password, pipe-joined in original order
    pub additional_data: Option<String>,
    /// Record encoding the source line was parsed under
    pub content_type: RecordEncoding,
    /// Container format of the originating archive
    pub file_type: ContainerFormat,
    /// Inner-file path the record came from
    pub filename: String,
    /// Identifier of the originating message
    pub source_message_id: i64,
    /// Timestamp of the originating archive delivery
    pub timestamp: DateTime<Utc>,
    /// Dedup identity, see [`fingerprint`]
    pub fingerprint: String,
}

impl CredentialRecord {
    /// Build a validated record from normalized fields plus provenance.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::InvalidEmail`] if the email is empty or does
    /// not contain exactly one `@`.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        additional_data: Option<String>,
        content_type: RecordEncoding,
        provenance: &Provenance,
    ) -> Result<Self, SiftError> {
        let email = email.into();
        let password = password.into();

        if email.is_empty() || email.chars().filter(|&c| c == '@').count() != 1 {
            return Err(SiftError::InvalidEmail(email));
        }
        // Safe: exactly one '@' was just verified
        let domain = email
            .split('@')
            .nth(1)
            .map(str::to_lowercase)
            .unwrap_or_default();
        if domain.is_empty() {
            return Err(SiftError::InvalidEmail(email));
        }

        let fingerprint = fingerprint(&email, &password);

        Ok(Self {
            email,
            domain,
            password,
            additional_data,
            content_type,
            file_type: provenance.container,
            filename: provenance.filename.clone(),
            source_message_id: provenance.source_message_id,
            timestamp: provenance.timestamp,
            fingerprint,
        })
    }
}

/// One row in the product's output schema.
///
/// Column order is the contract with the storage collaborator:
/// `timestamp, filename, file_type, content_type, email, domain, password,
/// additional_data, source_message_id`. Field order here *is* the column
/// order for CSV serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    /// Delivery timestamp of the originating archive
    pub timestamp: DateTime<Utc>,
    /// Inner-file path the record came from
    pub filename: String,
    /// Container format of the originating archive
    pub file_type: ContainerFormat,
    /// Record encoding the source line was parsed under
    pub content_type: RecordEncoding,
    /// Email address, original casing
    pub email: String,
    /// Lower-cased domain
    pub domain: String,
    /// Password, verbatim
    pub password: String,
    /// Pipe-joined extra fields, empty when absent
    pub additional_data: String,
    /// Identifier of the originating message
    pub source_message_id: i64,
}

impl From<&CredentialRecord> for OutputRow {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            filename: record.filename.clone(),
            file_type: record.file_type,
            content_type: record.content_type,
            email: record.email.clone(),
            domain: record.domain.clone(),
            password: record.password.clone(),
            additional_data: record.additional_data.clone().unwrap_or_default(),
            source_message_id: record.source_message_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn provenance() -> Provenance {
        Provenance {
            filename: "combo/list.txt".to_string(),
            container: ContainerFormat::Zip,
            source_message_id: 991,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
        }
    }

    #[test]
    fn test_fingerprint_case_insensitive() {
        let a = fingerprint("User@Example.com", "Secret1");
        let b = fingerprint("user@example.com", "secret1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 hex
    }

    #[test]
    fn test_fingerprint_nul_separator() {
        // "ab" + "c" must not collide with "a" + "bc"
        assert_ne!(fingerprint("ab", "c"), fingerprint("a", "bc"));
    }

    #[test]
    fn test_record_domain_lowercased_email_preserved() {
        let record = CredentialRecord::new(
            "User@Example.com",
            "Pass123",
            None,
            RecordEncoding::Colon,
            &provenance(),
        )
        .unwrap();

        assert_eq!(record.domain, "example.com");
        assert_eq!(record.email, "User@Example.com");
        assert_eq!(record.password, "Pass123");
    }

    #[test]
    fn test_record_rejects_invalid_email() {
        for email in ["", "no-at-sign", "two@at@signs", "trailing@"] {
            let result = CredentialRecord::new(
                email,
                "pw",
                None,
                RecordEncoding::Colon,
                &provenance(),
            );
            assert!(
                matches!(result, Err(SiftError::InvalidEmail(_))),
                "email {email:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_record_is_immutable_by_construction() {
        let record = CredentialRecord::new(
            "a@b.com",
            "pw",
            Some("extra1|extra2".to_string()),
            RecordEncoding::Semicolon,
            &provenance(),
        )
        .unwrap();
        assert_eq!(record.fingerprint, fingerprint("a@b.com", "pw"));
        assert_eq!(record.additional_data.as_deref(), Some("extra1|extra2"));
    }

    #[test]
    fn test_output_row_column_values() {
        let record = CredentialRecord::new(
            "a@b.com",
            "pw",
            None,
            RecordEncoding::Json,
            &provenance(),
        )
        .unwrap();
        let row = OutputRow::from(&record);

        assert_eq!(row.filename, "combo/list.txt");
        assert_eq!(row.file_type, ContainerFormat::Zip);
        assert_eq!(row.content_type, RecordEncoding::Json);
        assert_eq!(row.additional_data, "");
        assert_eq!(row.source_message_id, 991);
    }
}
