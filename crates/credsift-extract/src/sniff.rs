//! Record-encoding classification.
//!
//! The sniffer is an ordered list of classifier predicates evaluated
//! first-match-wins over a bounded sample of the input. The ordering
//! reflects real-world data quality: structured exports (JSON, delimited)
//! are unambiguous when present; free text is the last resort and is
//! inherently lossy. Keeping the chain as data makes the policy testable
//! and swappable.

use credsift_core::RecordEncoding;
use once_cell::sync::Lazy;
use regex::Regex;

/// Number of non-empty lines sampled for majority votes.
///
/// Bounds classification cost on pathologically large files; the parser
/// still consumes every line afterwards.
pub const SAMPLE_LINES: usize = 200;

/// JSON object keys recognized as the email/username field
pub const EMAIL_KEYS: [&str; 5] = ["email", "username", "user", "login", "mail"];

/// JSON object keys recognized as the password field
pub const PASSWORD_KEYS: [&str; 3] = ["password", "pass", "pwd"];

/// Loose email shape for the COLON left-side check
static LOOSE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s:;]+@[^@\s:;]+\.[^@\s:;]+$").expect("valid regex"));

/// Loose username shape for the COLON left-side check
static LOOSE_USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{3,}$").expect("valid regex"));

/// The bounded view of a file the classifier predicates vote on
#[derive(Debug)]
pub struct Sample<'a> {
    /// Full input text, for whole-document probes (JSON array parse)
    pub text: &'a str,
    /// First [`SAMPLE_LINES`] non-empty trimmed lines
    pub lines: Vec<&'a str>,
}

impl<'a> Sample<'a> {
    /// Take the classification sample from raw text
    #[must_use = "returns the sample the classifiers vote on"]
    pub fn take(text: &'a str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(SAMPLE_LINES)
            .collect();
        Self { text, lines }
    }

    /// Strict majority over the sampled lines
    fn majority(&self, predicate: impl Fn(&str) -> bool) -> bool {
        if self.lines.is_empty() {
            return false;
        }
        let hits = self.lines.iter().filter(|l| predicate(l)).count();
        hits * 2 > self.lines.len()
    }
}

/// One classification predicate in the ordered chain
pub struct Classifier {
    /// Name used in logs and tests
    pub name: &'static str,
    /// Encoding this classifier votes for
    pub encoding: RecordEncoding,
    /// Whether the sample matches
    pub matches: fn(&Sample<'_>) -> bool,
}

/// The default classifier chain, evaluated in order, first match wins.
///
/// FREETEXT is deliberately absent: it is the fallback when no classifier
/// matches, reported as an ambiguous classification.
pub const CLASSIFIERS: &[Classifier] = &[
    Classifier {
        name: "json",
        encoding: RecordEncoding::Json,
        matches: matches_json,
    },
    Classifier {
        name: "semicolon",
        encoding: RecordEncoding::Semicolon,
        matches: matches_semicolon,
    },
    Classifier {
        name: "colon",
        encoding: RecordEncoding::Colon,
        matches: matches_colon,
    },
];

/// Outcome of classifying one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Chosen encoding
    pub encoding: RecordEncoding,
    /// True when no classifier matched and the encoding is the FREETEXT
    /// fallback; recorded as `ClassificationAmbiguous` in diagnostics
    pub ambiguous: bool,
}

/// Classify text into one of the record encodings.
///
/// Never fails: when no classifier matches, the result is the FREETEXT
/// fallback with `ambiguous` set.
#[must_use = "returns the classification for the text"]
pub fn classify(text: &str) -> Classification {
    let sample = Sample::take(text);

    for classifier in CLASSIFIERS {
        if (classifier.matches)(&sample) {
            return Classification {
                encoding: classifier.encoding,
                ambiguous: false,
            };
        }
    }

    Classification {
        encoding: RecordEncoding::Freetext,
        ambiguous: true,
    }
}

/// Does a JSON value look like a credential object?
fn object_has_credential_keys(value: &serde_json::Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.keys().any(|k| {
            let k = k.to_lowercase();
            EMAIL_KEYS.contains(&k.as_str()) || PASSWORD_KEYS.contains(&k.as_str())
        })
    })
}

/// JSON: whole text parses as an array of credential objects, a single
/// credential object, or the sampled lines are NDJSON credential objects
fn matches_json(sample: &Sample<'_>) -> bool {
    let trimmed = sample.text.trim_start();
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return false;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(sample.text) {
        return match &value {
            serde_json::Value::Array(items) => items.iter().any(object_has_credential_keys),
            obj @ serde_json::Value::Object(_) => object_has_credential_keys(obj),
            _ => false,
        };
    }

    // Newline-delimited objects: every sampled line must parse, and at
    // least one must carry a recognizable key
    let mut any_credential = false;
    for line in &sample.lines {
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) if value.is_object() => {
                any_credential = any_credential || object_has_credential_keys(&value);
            }
            _ => return false,
        }
    }
    any_credential
}

/// SEMICOLON: majority of lines have exactly one `;` with non-empty sides
fn matches_semicolon(sample: &Sample<'_>) -> bool {
    sample.majority(|line| {
        line.matches(';').count() == 1
            && line
                .split_once(';')
                .is_some_and(|(l, r)| !l.trim().is_empty() && !r.trim().is_empty())
    })
}

/// COLON: majority of lines have exactly one `:` and an email-or-username
/// left side
fn matches_colon(sample: &Sample<'_>) -> bool {
    sample.majority(|line| {
        line.matches(':').count() == 1
            && line.split_once(':').is_some_and(|(l, _)| {
                let l = l.trim();
                LOOSE_EMAIL.is_match(l) || LOOSE_USERNAME.is_match(l)
            })
    })
}
