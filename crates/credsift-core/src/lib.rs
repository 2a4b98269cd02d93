//! # credsift-core — Canonical types for the credsift pipeline
//!
//! credsift ingests compressed archives delivered through a monitored
//! message stream, extracts their contents, parses credential records from
//! heterogeneous text encodings, deduplicates them against previously seen
//! records, and emits normalized structured rows.
//!
//! This crate carries the shared vocabulary of that pipeline:
//!
//! - [`ContainerFormat`] / [`RecordEncoding`] — the closed format sets
//! - [`ArchivePayload`], [`InnerFile`], [`RawRecord`] — stage inputs/outputs
//! - [`CredentialRecord`] / [`OutputRow`] — the canonical persisted shape
//! - [`SiftError`] — the error taxonomy, with a [`Result`] alias
//! - [`Diagnostic`] — structured per-batch drop reporting
//!
//! Stage logic lives in the sibling crates: `credsift-archive` (container
//! decoding), `credsift-extract` (classification, parsing, normalization),
//! and `credsift-pipeline` (dedup + orchestration).

pub mod diagnostics;
pub mod error;
pub mod format;
pub mod record;

pub use diagnostics::{Diagnostic, DropReason, Stage};
pub use error::{Result, SiftError};
pub use format::{ContainerFormat, RecordEncoding};
pub use record::{
    fingerprint, ArchivePayload, CredentialRecord, InnerFile, OutputRow, Provenance, RawRecord,
};
