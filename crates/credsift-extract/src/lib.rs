//! # credsift-extract — Classification, parsing, and normalization
//!
//! The text stages of the credsift pipeline. Given an inner file pulled
//! out of an archive:
//!
//! 1. [`decode_text`] recovers a string from heterogeneous byte encodings
//!    (invalid sequences are dropped, matching upstream export tooling).
//! 2. [`sniff::classify`] picks a [`credsift_core::RecordEncoding`] via an
//!    ordered classifier chain, first match wins.
//! 3. [`parse::parse`] produces positional raw records, counting malformed
//!    lines instead of failing the file.
//! 4. [`normalize::normalize`] validates and maps each raw record into the
//!    canonical [`credsift_core::CredentialRecord`] shape.

pub mod normalize;
pub mod parse;
pub mod sniff;

pub use normalize::normalize;
pub use parse::{parse, ParseOutcome};
pub use sniff::{classify, Classification, Classifier, Sample, CLASSIFIERS, SAMPLE_LINES};

/// Decode inner-file bytes into text, dropping invalid sequences.
///
/// Credential dumps arrive in whatever encoding the exporting tool used;
/// lossy UTF-8 keeps every parseable line instead of rejecting the file.
#[must_use = "returns the decoded text that should be classified"]
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use credsift_core::RecordEncoding;

    #[test]
    fn test_decode_text_lossy() {
        let mut bytes = b"user@x.com:Pass".to_vec();
        bytes.push(0xff); // invalid UTF-8
        let text = decode_text(&bytes);
        assert!(text.starts_with("user@x.com:Pass"));
    }

    #[test]
    fn test_stages_compose() {
        let text = "user@x.com:Pass123\nuser2@y.com:Pass456";
        let classification = classify(text);
        assert_eq!(classification.encoding, RecordEncoding::Colon);

        let outcome = parse(text, classification.encoding);
        assert_eq!(outcome.records.len(), 2);
    }
}
