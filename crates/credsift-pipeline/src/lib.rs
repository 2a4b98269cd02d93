//! # credsift-pipeline — Orchestration and deduplication
//!
//! Ties the stage crates together into one run per archive:
//!
//! ```text
//! ArchivePayload
//!   └─ credsift-archive::decode        container detection + extraction
//!        └─ credsift-extract::classify  encoding per inner file
//!             └─ credsift-extract::parse      raw records
//!                  └─ credsift-extract::normalize  canonical records
//!                       └─ Deduplicator::accept    batch filter + commit
//!                            └─ Batch { records, diagnostics }
//! ```
//!
//! Multiple archives may be processed concurrently by independent workers;
//! the only shared resource is the dedup index behind its
//! [`SharedDedupIndex`] handle, and batch filter+commit runs as a single
//! critical section on it.
//!
//! # Example
//!
//! ```rust,ignore
//! use credsift_pipeline::{DedupIndex, Pipeline};
//!
//! let index = DedupIndex::new().into_handle();
//! let pipeline = Pipeline::new(index);
//!
//! let batch = pipeline.process(&payload);
//! for row in batch.rows() {
//!     println!("{} {}", row.email, row.domain);
//! }
//! ```

pub mod dedup;
pub mod orchestrator;

pub use dedup::{DedupIndex, Deduplicator, SharedDedupIndex};
pub use orchestrator::{Batch, Pipeline, RunState};
