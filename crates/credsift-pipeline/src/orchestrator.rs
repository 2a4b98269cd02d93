//! Per-archive pipeline orchestration.
//!
//! One archive moves through a linear state machine:
//! `RECEIVED → DECODING → PROCESSING(per inner file) → DEDUPING →
//! COMPLETE | PARTIAL_FAILURE`. Failures at any stage are captured into the
//! batch diagnostics; nothing below the archive level propagates upward.

use crate::dedup::{Deduplicator, SharedDedupIndex};
use credsift_archive::{decode, ArchiveError};
use credsift_core::{
    ArchivePayload, ContainerFormat, CredentialRecord, Diagnostic, DropReason, OutputRow,
    Provenance, SiftError, Stage,
};
use credsift_extract::{classify, decode_text, normalize, parse};
use log::{debug, info, warn};

/// States of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Payload handed over by the message-stream collaborator
    Received,
    /// Container detection and extraction
    Decoding,
    /// Inner files moving through classify/parse/normalize
    Processing,
    /// Batch-level dedup filter and commit
    Deduping,
    /// Every inner file processed cleanly
    Complete,
    /// At least one inner file failed unrecoverably; the rest of the
    /// batch still completed
    PartialFailure,
}

impl std::fmt::Display for RunState {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "RECEIVED",
            Self::Decoding => "DECODING",
            Self::Processing => "PROCESSING",
            Self::Deduping => "DEDUPING",
            Self::Complete => "COMPLETE",
            Self::PartialFailure => "PARTIAL_FAILURE",
        };
        write!(f, "{s}")
    }
}

/// Everything one pipeline run produced for one archive
#[derive(Debug)]
pub struct Batch {
    /// Terminal state: [`RunState::Complete`] or [`RunState::PartialFailure`]
    pub state: RunState,
    /// Filename of the processed archive
    pub archive_filename: String,
    /// Detected container format, when detection succeeded
    pub container: Option<ContainerFormat>,
    /// Newly accepted records, in extraction order
    pub records: Vec<CredentialRecord>,
    /// Records dropped by the dedup layers (expected steady state, not an
    /// error)
    pub duplicates_filtered: usize,
    /// Structured drop/degradation reporting; empty on a clean run
    pub diagnostics: Vec<Diagnostic>,
}

impl Batch {
    /// Render accepted records as storage-collaborator output rows
    #[must_use = "returns the rows to hand to the storage collaborator"]
    pub fn rows(&self) -> Vec<OutputRow> {
        self.records.iter().map(OutputRow::from).collect()
    }
}

/// The extraction-and-normalization pipeline.
///
/// One `Pipeline` may be shared by value across workers; each archive runs
/// sequentially on its worker, and only the dedup index behind the injected
/// handle is shared state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    dedup: Deduplicator,
}

impl Pipeline {
    /// Build a pipeline over an injected dedup index handle
    #[must_use = "returns a pipeline that should process payloads"]
    pub fn new(index: SharedDedupIndex) -> Self {
        Self {
            dedup: Deduplicator::new(index),
        }
    }

    /// Run one archive through the pipeline.
    ///
    /// Decode failures of the whole archive degrade to an empty
    /// partial-failure batch; only the upstream inability to supply payload
    /// bytes at all is the caller's problem, and that never reaches here.
    #[must_use = "returns the batch produced from the payload"]
    pub fn process(&self, payload: &ArchivePayload) -> Batch {
        let mut state = RunState::Received;
        debug!("{}: {state}", payload.filename);

        state = RunState::Decoding;
        debug!("{}: {state}", payload.filename);

        let outcome = match decode(&payload.filename, &payload.bytes) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{}: archive-level decode failure: {e}", payload.filename);
                return Self::failed_batch(payload, &e);
            }
        };

        state = RunState::Processing;
        debug!("{}: {state}", payload.filename);

        let mut diagnostics = outcome.diagnostics;
        // Decode-stage corruption already marks the run partial
        let mut unrecoverable_failures = diagnostics
            .iter()
            .filter(|d| d.reason == DropReason::CorruptArchive)
            .count();

        let mut candidates: Vec<CredentialRecord> = Vec::new();

        for file in &outcome.files {
            if file.depth_exceeded {
                // Already surfaced by the decoder; nothing to parse
                continue;
            }

            let text = decode_text(&file.bytes);
            let classification = classify(&text);
            if classification.ambiguous {
                diagnostics.push(Diagnostic::inner_file(
                    Stage::Classify,
                    file.path.clone(),
                    DropReason::ClassificationAmbiguous,
                    "no classifier matched; scanned as FREETEXT",
                ));
            }

            let parsed = parse(&text, classification.encoding);
            for line in &parsed.malformed {
                diagnostics.push(Diagnostic::inner_file(
                    Stage::Parse,
                    file.path.clone(),
                    DropReason::MalformedLine,
                    format!("line {line}"),
                ));
            }

            let provenance = Provenance {
                filename: file.path.clone(),
                container: outcome.container,
                source_message_id: payload.source_message_id,
                timestamp: payload.received_at,
            };

            let mut extracted_from_file = 0usize;
            for raw in &parsed.records {
                match normalize(raw, &provenance) {
                    Ok(record) => {
                        candidates.push(record);
                        extracted_from_file += 1;
                    }
                    Err(SiftError::InvalidEmail(email)) => {
                        diagnostics.push(Diagnostic::inner_file(
                            Stage::Normalize,
                            file.path.clone(),
                            DropReason::InvalidEmail,
                            format!("line {}: {email:?}", raw.source_line),
                        ));
                    }
                    Err(e) => {
                        diagnostics.push(Diagnostic::inner_file(
                            Stage::Normalize,
                            file.path.clone(),
                            DropReason::MalformedLine,
                            e.to_string(),
                        ));
                    }
                }
            }

            // A file the sniffer could not classify that also yielded
            // nothing counts as an unrecoverable inner-file failure
            if classification.ambiguous && extracted_from_file == 0 {
                unrecoverable_failures += 1;
            }
        }

        state = RunState::Deduping;
        debug!("{}: {state}", payload.filename);

        let candidate_count = candidates.len();
        let records = self.dedup.accept(candidates);
        let duplicates_filtered = candidate_count - records.len();

        state = if unrecoverable_failures > 0 {
            RunState::PartialFailure
        } else {
            RunState::Complete
        };
        info!(
            "{}: {state}, {} records accepted, {} duplicates filtered, {} diagnostics",
            payload.filename,
            records.len(),
            duplicates_filtered,
            diagnostics.len()
        );

        Batch {
            state,
            archive_filename: payload.filename.clone(),
            container: Some(outcome.container),
            records,
            duplicates_filtered,
            diagnostics,
        }
    }

    /// Batch for an archive that could not be decoded at all
    fn failed_batch(payload: &ArchivePayload, error: &ArchiveError) -> Batch {
        let reason = match error {
            ArchiveError::UnsupportedFormat(_) => DropReason::UnsupportedFormat,
            _ => DropReason::CorruptArchive,
        };
        Batch {
            state: RunState::PartialFailure,
            archive_filename: payload.filename.clone(),
            container: None,
            records: Vec::new(),
            duplicates_filtered: 0,
            diagnostics: vec![Diagnostic::archive(Stage::Decode, reason, error.to_string())],
        }
    }
}
