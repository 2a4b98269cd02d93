//! Structured per-batch diagnostics.
//!
//! Every pipeline run produces a diagnostics list, empty on full success.
//! Operators audit lossy extractions through this list; nothing is ever
//! silently dropped.

use serde::{Deserialize, Serialize};

/// Pipeline stage a diagnostic originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Container detection and extraction
    Decode,
    /// Record-encoding classification
    Classify,
    /// Per-encoding record parsing
    Parse,
    /// Field validation and canonicalization
    Normalize,
    /// Cross-run identity filtering
    Dedup,
}

impl std::fmt::Display for Stage {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Decode => "decode",
            Self::Classify => "classify",
            Self::Parse => "parse",
            Self::Normalize => "normalize",
            Self::Dedup => "dedup",
        };
        write!(f, "{s}")
    }
}

/// Why a record, inner file, or archive was dropped or degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// Unknown container signature; the archive was skipped
    UnsupportedFormat,
    /// Recognized container that could not be read; the file was skipped
    CorruptArchive,
    /// No classifier matched confidently; content fell back to FREETEXT
    ClassificationAmbiguous,
    /// A line failed to parse under its encoding; counted, never fatal
    MalformedLine,
    /// Email field failed shape validation; the record was dropped
    InvalidEmail,
    /// Nested archive deeper than the recursion budget; surfaced unparsed
    DepthExceeded,
    /// Inner file larger than the per-file cap; skipped
    FileTooLarge,
}

impl std::fmt::Display for DropReason {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::UnsupportedFormat => "UnsupportedFormat",
            Self::CorruptArchive => "CorruptArchive",
            Self::ClassificationAmbiguous => "ClassificationAmbiguous",
            Self::MalformedLine => "MalformedLine",
            Self::InvalidEmail => "InvalidEmail",
            Self::DepthExceeded => "DepthExceeded",
            Self::FileTooLarge => "FileTooLarge",
        };
        write!(f, "{s}")
    }
}

/// One structured diagnostic entry attached to a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stage the entry originated from
    pub stage: Stage,
    /// Path of the inner file involved, if any
    pub inner_path: Option<String>,
    /// Why the item was dropped or degraded
    pub reason: DropReason,
    /// Free-form detail: line number, decoder message, nested path
    pub detail: Option<String>,
}

impl Diagnostic {
    /// Diagnostic for a whole-archive condition (no inner path)
    #[must_use = "constructs a diagnostic that should be attached to a batch"]
    pub fn archive(stage: Stage, reason: DropReason, detail: impl Into<String>) -> Self {
        Self {
            stage,
            inner_path: None,
            reason,
            detail: Some(detail.into()),
        }
    }

    /// Diagnostic for a specific inner file
    #[must_use = "constructs a diagnostic that should be attached to a batch"]
    pub fn inner_file(
        stage: Stage,
        inner_path: impl Into<String>,
        reason: DropReason,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            inner_path: Some(inner_path.into()),
            reason,
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display_matches_taxonomy() {
        assert_eq!(DropReason::MalformedLine.to_string(), "MalformedLine");
        assert_eq!(DropReason::InvalidEmail.to_string(), "InvalidEmail");
        assert_eq!(
            DropReason::UnsupportedFormat.to_string(),
            "UnsupportedFormat"
        );
    }

    #[test]
    fn test_diagnostic_constructors() {
        let diag = Diagnostic::inner_file(
            Stage::Parse,
            "logs/passwords.txt",
            DropReason::MalformedLine,
            "line 42",
        );
        assert_eq!(diag.inner_path.as_deref(), Some("logs/passwords.txt"));
        assert_eq!(diag.reason, DropReason::MalformedLine);

        let diag = Diagnostic::archive(Stage::Decode, DropReason::UnsupportedFormat, "bad magic");
        assert!(diag.inner_path.is_none());
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diag = Diagnostic::archive(Stage::Decode, DropReason::CorruptArchive, "bad CRC");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains(r#""stage":"decode""#));
        assert!(json.contains(r#""reason":"CorruptArchive""#));
    }
}
