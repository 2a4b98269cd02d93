//! CSV output sink.
//!
//! Stand-in for the storage collaborator: appends finalized batches to a
//! CSV file with the product's column schema and exposes the previously
//! written rows as dedup-index seed material, which is what makes the
//! index durable across process restarts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use credsift_core::{fingerprint, OutputRow};
use log::warn;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Appends accepted rows to a CSV file, writing the header once
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Sink writing to `path`; the file is created on first append
    #[must_use = "returns a sink that should receive batches"]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing CSV file
    #[must_use = "returns the sink's file path"]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recover `(fingerprint, first_seen)` pairs from previously written
    /// rows. An absent file is an empty store, not an error.
    pub fn seed_fingerprints(&self) -> Result<Vec<(String, DateTime<Utc>)>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("opening output file {}", self.path.display()))?;

        let headers = reader.headers()?.clone();
        let email_idx = headers.iter().position(|h| h == "email");
        let password_idx = headers.iter().position(|h| h == "password");
        let timestamp_idx = headers.iter().position(|h| h == "timestamp");
        let (Some(email_idx), Some(password_idx)) = (email_idx, password_idx) else {
            warn!(
                "{}: missing email/password columns, starting with an empty index",
                self.path.display()
            );
            return Ok(Vec::new());
        };

        let mut seeds = Vec::new();
        for record in reader.records() {
            let record = record?;
            let Some(email) = record.get(email_idx) else {
                continue;
            };
            let password = record.get(password_idx).unwrap_or_default();
            let first_seen = timestamp_idx
                .and_then(|idx| record.get(idx))
                .and_then(|ts| ts.parse::<DateTime<Utc>>().ok())
                .unwrap_or_else(Utc::now);
            seeds.push((fingerprint(email, password), first_seen));
        }

        Ok(seeds)
    }

    /// Append a finalized batch, creating the file with headers when it
    /// does not exist yet. Returns the number of rows written.
    pub fn append(&self, rows: &[OutputRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let write_headers = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening output file {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_headers)
            .from_writer(file);

        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(rows.len())
    }
}
