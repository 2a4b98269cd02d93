//! Cross-run deduplication.
//!
//! The `DedupIndex` is the only resource shared across concurrent pipeline
//! workers. It is injected as an explicit `Arc<Mutex<_>>` handle, never
//! ambient state; the `Deduplicator` is its sole mutator. Batch filtering
//! and committing run under one critical section so two workers processing
//! archives at the same instant cannot both accept the same fingerprint.

use chrono::{DateTime, Utc};
use credsift_core::CredentialRecord;
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Persistent mapping `fingerprint → first-seen timestamp`.
///
/// Loaded from the external store's existing fingerprints at process start
/// and snapshot back for persistence at teardown; durability itself is the
/// store's concern.
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashMap<String, DateTime<Utc>>,
}

impl DedupIndex {
    /// Empty index (fresh store)
    #[must_use = "returns a new index that should be shared via handle()"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload from previously persisted fingerprints
    #[must_use = "returns the loaded index that should be shared via handle()"]
    pub fn load(fingerprints: impl IntoIterator<Item = (String, DateTime<Utc>)>) -> Self {
        Self {
            seen: fingerprints.into_iter().collect(),
        }
    }

    /// Wrap into the shared handle the pipeline workers take
    #[must_use = "returns the shared handle passed to Deduplicator::new"]
    pub fn into_handle(self) -> SharedDedupIndex {
        Arc::new(Mutex::new(self))
    }

    /// Whether a fingerprint has been accepted before
    #[inline]
    #[must_use = "returns whether the fingerprint was already accepted"]
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.seen.contains_key(fingerprint)
    }

    /// Record a fingerprint. Returns `false` without updating when the
    /// fingerprint already exists (idempotent; first-seen wins).
    pub fn insert(&mut self, fingerprint: &str, first_seen: DateTime<Utc>) -> bool {
        match self.seen.entry(fingerprint.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(first_seen);
                true
            }
        }
    }

    /// Number of distinct fingerprints
    #[must_use = "returns the number of distinct fingerprints"]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether the index is empty
    #[must_use = "returns whether the index is empty"]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// All committed fingerprints, for persistence at teardown
    #[must_use = "returns the snapshot the store should persist"]
    pub fn snapshot(&self) -> Vec<(String, DateTime<Utc>)> {
        self.seen
            .iter()
            .map(|(fp, ts)| (fp.clone(), *ts))
            .collect()
    }
}

/// Shared, lifetime-scoped handle to the process-wide dedup index
pub type SharedDedupIndex = Arc<Mutex<DedupIndex>>;

/// Filters record batches against the shared index.
///
/// Dedup is two-layered: within one batch the first occurrence by parse
/// order wins (one archive often repeats the same credential across inner
/// files); across batches the index wins.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    index: SharedDedupIndex,
}

impl Deduplicator {
    /// Attach to a shared index handle
    #[must_use = "returns a deduplicator that should filter batches"]
    pub fn new(index: SharedDedupIndex) -> Self {
        Self { index }
    }

    /// Filter a batch to records not previously seen, without committing.
    ///
    /// Must be called before [`Deduplicator::commit`]. Prefer
    /// [`Deduplicator::accept`], which runs both under one lock.
    #[must_use = "returns the records that were not previously seen"]
    pub fn filter(&self, records: Vec<CredentialRecord>) -> Vec<CredentialRecord> {
        let index = self.index.lock().expect("dedup index lock poisoned");
        Self::filter_locked(&index, records)
    }

    /// Durably record fingerprints of accepted records.
    ///
    /// Committing a fingerprint that already exists is a no-op, which makes
    /// redundant delivery of the same archive harmless.
    pub fn commit(&self, records: &[CredentialRecord]) {
        let mut index = self.index.lock().expect("dedup index lock poisoned");
        Self::commit_locked(&mut index, records);
    }

    /// Filter and commit one batch as a single critical section.
    ///
    /// This is the combined operation concurrent workers must use: with
    /// separate `filter`/`commit` calls, two archives carrying the same
    /// fingerprint could interleave between them and both get accepted.
    #[must_use = "returns the newly accepted records"]
    pub fn accept(&self, records: Vec<CredentialRecord>) -> Vec<CredentialRecord> {
        let mut index = self.index.lock().expect("dedup index lock poisoned");
        let fresh = Self::filter_locked(&index, records);
        Self::commit_locked(&mut index, &fresh);
        fresh
    }

    fn filter_locked(index: &DedupIndex, records: Vec<CredentialRecord>) -> Vec<CredentialRecord> {
        let total = records.len();
        let mut in_batch: HashSet<String> = HashSet::new();
        let fresh: Vec<CredentialRecord> = records
            .into_iter()
            .filter(|record| {
                !index.contains(&record.fingerprint) && in_batch.insert(record.fingerprint.clone())
            })
            .collect();
        debug!(
            "dedup: {} of {} records are new",
            fresh.len(),
            total
        );
        fresh
    }

    fn commit_locked(index: &mut DedupIndex, records: &[CredentialRecord]) {
        for record in records {
            index.insert(&record.fingerprint, record.timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use credsift_core::{ContainerFormat, Provenance, RecordEncoding};

    fn record(email: &str, password: &str) -> CredentialRecord {
        let provenance = Provenance {
            filename: "combo.txt".to_string(),
            container: ContainerFormat::Zip,
            source_message_id: 7,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap(),
        };
        CredentialRecord::new(email, password, None, RecordEncoding::Colon, &provenance).unwrap()
    }

    #[test]
    fn test_within_batch_first_occurrence_wins() {
        let dedup = Deduplicator::new(DedupIndex::new().into_handle());

        let batch = vec![
            record("a@b.com", "pw1"),
            record("a@b.com", "pw1"), // duplicate inside the same archive
            record("c@d.com", "pw2"),
        ];
        let accepted = dedup.accept(batch);
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].email, "a@b.com");
        assert_eq!(accepted[1].email, "c@d.com");
    }

    #[test]
    fn test_accept_is_idempotent_across_calls() {
        let dedup = Deduplicator::new(DedupIndex::new().into_handle());

        let batch = vec![record("a@b.com", "pw1"), record("c@d.com", "pw2")];
        let first = dedup.accept(batch.clone());
        assert_eq!(first.len(), 2);

        // Identical record set again: zero newly accepted
        let second = dedup.accept(batch);
        assert!(second.is_empty());
    }

    #[test]
    fn test_filter_respects_preloaded_index() {
        let known = record("a@b.com", "pw1");
        let index = DedupIndex::load([(known.fingerprint.clone(), known.timestamp)]);
        let dedup = Deduplicator::new(index.into_handle());

        let accepted = dedup.filter(vec![record("a@b.com", "pw1"), record("c@d.com", "pw2")]);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].email, "c@d.com");
    }

    #[test]
    fn test_commit_keeps_first_seen_timestamp() {
        let mut index = DedupIndex::new();
        let early = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        assert!(index.insert("fp", early));
        assert!(!index.insert("fp", late));
        assert_eq!(index.snapshot(), vec![("fp".to_string(), early)]);
    }

    #[test]
    fn test_case_variants_share_identity() {
        let dedup = Deduplicator::new(DedupIndex::new().into_handle());

        let accepted = dedup.accept(vec![
            record("User@Example.com", "Secret"),
            record("user@example.com", "secret"),
        ]);
        assert_eq!(accepted.len(), 1, "case variants are the same fact");
    }

    #[test]
    fn test_concurrent_accept_single_winner() {
        use std::thread;

        let handle = DedupIndex::new().into_handle();
        let mut workers = Vec::new();

        for _ in 0..8 {
            let dedup = Deduplicator::new(Arc::clone(&handle));
            workers.push(thread::spawn(move || {
                dedup.accept(vec![record("shared@x.com", "same-pass")]).len()
            }));
        }

        let total_accepted: usize = workers
            .into_iter()
            .map(|w| w.join().expect("worker panicked"))
            .sum();
        assert_eq!(
            total_accepted, 1,
            "exactly one worker may accept a shared fingerprint"
        );
    }
}
