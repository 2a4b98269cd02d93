//! Container and record-encoding format types
//!
//! This module defines the `ContainerFormat` enum for the supported archive
//! containers and the `RecordEncoding` enum for the credential record
//! encodings the extractor can classify.

use serde::{Deserialize, Serialize};

/// Archive container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContainerFormat {
    /// ZIP archive (.zip)
    #[serde(rename = "ZIP")]
    Zip,
    /// RAR archive (.rar), RAR4 and RAR5
    #[serde(rename = "RAR")]
    Rar,
    /// 7Z archive (.7z)
    #[serde(rename = "7Z")]
    SevenZ,
    /// TAR archive (.tar, .tar.gz, .tgz, .tar.bz2, .tbz2)
    #[serde(rename = "TAR")]
    Tar,
}

impl ContainerFormat {
    /// Detect container format from a file extension.
    ///
    /// Extension detection is the *fallback* path only; magic-byte
    /// signature detection in `credsift-archive` always runs first, since
    /// monitored sources routinely mislabel files.
    #[inline]
    #[must_use = "detects container format from file extension"]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "zip" => Some(Self::Zip),
            "rar" => Some(Self::Rar),
            "7z" => Some(Self::SevenZ),
            "tar" | "tgz" | "tbz2" | "tbz" | "gz" | "bz2" => Some(Self::Tar),
            _ => None,
        }
    }

    /// Detect container format from a full filename, handling multi-part
    /// extensions like `.tar.gz`.
    #[must_use = "detects container format from filename"]
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        for (suffix, format) in [
            (".tar.gz", Self::Tar),
            (".tar.bz2", Self::Tar),
            (".zip", Self::Zip),
            (".rar", Self::Rar),
            (".7z", Self::SevenZ),
            (".tar", Self::Tar),
            (".tgz", Self::Tar),
            (".tbz2", Self::Tar),
        ] {
            if lower.ends_with(suffix) {
                return Some(format);
            }
        }
        None
    }

    /// Get file extensions associated with this format
    #[inline]
    #[must_use = "returns file extensions for this format"]
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Zip => &["zip"],
            Self::Rar => &["rar"],
            Self::SevenZ => &["7z"],
            Self::Tar => &["tar", "tgz", "tar.gz", "tbz2", "tar.bz2"],
        }
    }
}

impl std::fmt::Display for ContainerFormat {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Zip => "ZIP",
            Self::Rar => "RAR",
            Self::SevenZ => "7Z",
            Self::Tar => "TAR",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ContainerFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ZIP" => Ok(Self::Zip),
            "RAR" => Ok(Self::Rar),
            "7Z" | "SEVENZ" => Ok(Self::SevenZ),
            "TAR" | "TGZ" | "TBZ2" => Ok(Self::Tar),
            _ => Err(format!("unknown container format: '{s}'")),
        }
    }
}

/// Credential record encoding
///
/// The closed set of encodings the format sniffer classifies extracted text
/// into. Ordering of the classifier chain lives in `credsift-extract`; this
/// type only names the outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordEncoding {
    /// `email:password` lines, split on the first colon
    #[serde(rename = "COLON")]
    Colon,
    /// `email;password;extra...` lines, split on the first semicolon
    #[serde(rename = "SEMICOLON")]
    Semicolon,
    /// JSON array or newline-delimited JSON objects with credential keys
    #[serde(rename = "JSON")]
    Json,
    /// Unstructured text scanned for `email<sep>password` substrings.
    /// Lowest-confidence path; also the fallback when classification is
    /// ambiguous.
    #[serde(rename = "FREETEXT")]
    Freetext,
}

impl RecordEncoding {
    /// Check whether this encoding is line-delimited (one record per line)
    #[inline]
    #[must_use = "returns whether this encoding is line-delimited"]
    pub const fn is_line_delimited(&self) -> bool {
        matches!(self, Self::Colon | Self::Semicolon)
    }

    /// The delimiter character for line-delimited encodings
    #[inline]
    #[must_use = "returns the delimiter for line-delimited encodings"]
    pub const fn delimiter(&self) -> Option<char> {
        match self {
            Self::Colon => Some(':'),
            Self::Semicolon => Some(';'),
            Self::Json | Self::Freetext => None,
        }
    }
}

impl std::fmt::Display for RecordEncoding {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Colon => "COLON",
            Self::Semicolon => "SEMICOLON",
            Self::Json => "JSON",
            Self::Freetext => "FREETEXT",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RecordEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COLON" => Ok(Self::Colon),
            "SEMICOLON" => Ok(Self::Semicolon),
            "JSON" => Ok(Self::Json),
            "FREETEXT" => Ok(Self::Freetext),
            _ => Err(format!("unknown record encoding: '{s}'")),
        }
    }
}
