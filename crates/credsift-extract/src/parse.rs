//! Per-encoding record parsing.
//!
//! Parsing never fails a whole file: malformed lines are counted and
//! skipped, and validation is deferred to the normalizer. Output order is
//! input line order, which provenance and dedup tie-breaking (first
//! occurrence wins) both rely on.

use crate::sniff::{EMAIL_KEYS, PASSWORD_KEYS};
use credsift_core::{RawRecord, RecordEncoding};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Free-text credential scan: `<token>@<token>.<token><sep><password-token>`
/// where the separator is one of `:;,| `. The password token must look like
/// one (no whitespace or separator characters, at least 4 chars).
static FREETEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+)[:;,| ]([^\s:;,|]{4,})")
        .expect("valid regex")
});

/// Result of parsing one inner file
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Raw records in input order
    pub records: Vec<RawRecord>,
    /// 1-based line numbers that failed to parse under the encoding
    pub malformed: Vec<usize>,
}

/// Parse classified text into raw records.
///
/// Never fails the file; see [`ParseOutcome::malformed`] for skipped lines.
#[must_use = "returns parsed records that should be normalized"]
pub fn parse(text: &str, encoding: RecordEncoding) -> ParseOutcome {
    match encoding {
        RecordEncoding::Colon => parse_delimited(text, ':', RecordEncoding::Colon),
        RecordEncoding::Semicolon => parse_delimited(text, ';', RecordEncoding::Semicolon),
        RecordEncoding::Json => parse_json(text),
        RecordEncoding::Freetext => parse_freetext(text),
    }
}

/// COLON / SEMICOLON: split each line on the *first* delimiter occurrence.
///
/// Passwords may legitimately contain the delimiter, so the remainder after
/// the email is never re-split for COLON. SEMICOLON remainders are split
/// further: the original exports carry `email;password;extra;...` rows, and
/// the extras belong in `additional_data`, not in the password.
fn parse_delimited(text: &str, delimiter: char, encoding: RecordEncoding) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for (idx, line) in text.lines().enumerate() {
        let source_line = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((left, rest)) = line.split_once(delimiter) else {
            debug!("line {source_line}: no {delimiter:?} delimiter, counted malformed");
            outcome.malformed.push(source_line);
            continue;
        };

        let mut fields: Vec<Option<String>> = vec![Some(left.trim().to_string())];
        match encoding {
            RecordEncoding::Semicolon => {
                let mut parts = rest.split(delimiter);
                fields.push(parts.next().map(|p| p.trim().to_string()));
                fields.extend(parts.map(|p| Some(p.trim().to_string())));
            }
            _ => fields.push(Some(rest.trim().to_string())),
        }

        outcome.records.push(RawRecord {
            encoding,
            fields,
            source_line,
        });
    }

    outcome
}

/// JSON: one record per array element or NDJSON line.
///
/// Missing expected keys become `None` fields rather than dropping the
/// record; shape validation happens in the normalizer. Remaining object
/// keys are carried as `key=value` extra fields.
fn parse_json(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        match value {
            serde_json::Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    push_json_record(item, idx + 1, &mut outcome);
                }
            }
            item @ serde_json::Value::Object(_) => push_json_record(&item, 1, &mut outcome),
            _ => outcome.malformed.push(1),
        }
        return outcome;
    }

    // Newline-delimited objects
    for (idx, line) in text.lines().enumerate() {
        let source_line = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(item) if item.is_object() => push_json_record(&item, source_line, &mut outcome),
            _ => outcome.malformed.push(source_line),
        }
    }

    outcome
}

/// Flatten one JSON object into a raw record
fn push_json_record(item: &serde_json::Value, source_line: usize, outcome: &mut ParseOutcome) {
    let Some(obj) = item.as_object() else {
        outcome.malformed.push(source_line);
        return;
    };

    let mut email: Option<String> = None;
    let mut password: Option<String> = None;
    let mut extras: Vec<Option<String>> = Vec::new();

    for (key, value) in obj {
        let lower = key.to_lowercase();
        let text = json_value_text(value);
        if email.is_none() && EMAIL_KEYS.contains(&lower.as_str()) {
            email = Some(text);
        } else if password.is_none() && PASSWORD_KEYS.contains(&lower.as_str()) {
            password = Some(text);
        } else {
            extras.push(Some(format!("{key}={text}")));
        }
    }

    let mut fields = vec![email, password];
    fields.extend(extras);

    outcome.records.push(RawRecord {
        encoding: RecordEncoding::Json,
        fields,
        source_line,
    });
}

/// Render a JSON value the way it would appear in a delimited export
fn json_value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// FREETEXT: scan every line for credential-shaped substrings.
///
/// The regex engine yields leftmost, non-overlapping matches with greedy
/// tokens, which is exactly the leftmost-longest preference; identical
/// pairs repeated within one line collapse to the first occurrence.
fn parse_freetext(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for (idx, line) in text.lines().enumerate() {
        let source_line = idx + 1;
        let mut seen_on_line: Vec<(String, String)> = Vec::new();

        for caps in FREETEXT_PATTERN.captures_iter(line) {
            let email = caps[1].to_string();
            let password = caps[2].to_string();
            let pair = (email.clone(), password.clone());
            if seen_on_line.contains(&pair) {
                continue;
            }
            seen_on_line.push(pair);

            outcome.records.push(RawRecord {
                encoding: RecordEncoding::Freetext,
                fields: vec![Some(email), Some(password)],
                source_line,
            });
        }
    }

    outcome
}
