//! Raw-record normalization.
//!
//! Maps positional raw fields into the canonical [`CredentialRecord`]
//! shape. Pure function: validation and field separation here, provenance
//! stamped from the orchestrator-supplied context.

use credsift_core::{CredentialRecord, Provenance, RawRecord, Result, SiftError};

/// Normalize one raw record into the canonical shape.
///
/// Field semantics are positional: `fields[0]` is the email, `fields[1]`
/// the password, anything further is extra data. The password is kept
/// verbatim apart from edge whitespace (passwords are case-sensitive);
/// extras are pipe-joined in original order.
///
/// # Errors
///
/// Returns [`SiftError::InvalidEmail`] when the email field is absent,
/// empty, or does not contain exactly one `@`.
#[must_use = "returns the normalized record that should be deduplicated"]
pub fn normalize(raw: &RawRecord, provenance: &Provenance) -> Result<CredentialRecord> {
    let email = raw
        .fields
        .first()
        .and_then(|f| f.as_deref())
        .map(str::trim)
        .unwrap_or_default();
    if email.is_empty() {
        return Err(SiftError::InvalidEmail(String::new()));
    }

    let password = raw
        .fields
        .get(1)
        .and_then(|f| f.as_deref())
        .map(str::trim)
        .unwrap_or_default();

    let extras: Vec<&str> = raw
        .fields
        .iter()
        .skip(2)
        .filter_map(|f| f.as_deref())
        .collect();
    let additional_data = if extras.is_empty() {
        None
    } else {
        Some(extras.join("|"))
    };

    CredentialRecord::new(email, password, additional_data, raw.encoding, provenance)
}
