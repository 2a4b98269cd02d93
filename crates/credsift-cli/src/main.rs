//! credsift CLI - archive ingestion and credential extraction tool
//!
//! Scans a spool directory for compressed archives delivered by the
//! upstream monitor, runs each through the extraction pipeline, appends
//! accepted rows to a CSV output file, and moves fully processed archives
//! aside so a rerun starts clean.

mod sink;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use credsift_archive::detect::has_archive_extension;
use credsift_core::ArchivePayload;
use credsift_pipeline::{Batch, DedupIndex, Pipeline, RunState};
use log::{info, warn};
use sink::CsvSink;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "credsift",
    version,
    about = "Extract, normalize, and deduplicate credential records from archives"
)]
struct Cli {
    /// Directory scanned for delivered archives
    #[arg(long, default_value = "downloads")]
    spool: PathBuf,

    /// CSV file accepted rows are appended to
    #[arg(long, default_value = "credentials.csv")]
    output: PathBuf,

    /// Directory processed archives are moved into
    #[arg(long, default_value = "processed")]
    processed: PathBuf,

    /// Leave processed archives in the spool directory
    #[arg(long)]
    keep_spool: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run(&Cli::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    fs::create_dir_all(&cli.spool)
        .with_context(|| format!("creating spool directory {}", cli.spool.display()))?;
    fs::create_dir_all(&cli.processed)
        .with_context(|| format!("creating processed directory {}", cli.processed.display()))?;

    let sink = CsvSink::new(&cli.output);

    // Durable dedup across restarts: the rows already written are the
    // store's existing fingerprints
    let seeds = sink.seed_fingerprints()?;
    info!("loaded {} known fingerprints from {}", seeds.len(), cli.output.display());
    let pipeline = Pipeline::new(DedupIndex::load(seeds).into_handle());

    let archives = spool_archives(&cli.spool)?;
    if archives.is_empty() {
        println!("no archives found in {}", cli.spool.display());
        return Ok(());
    }

    let mut total_accepted = 0usize;
    let mut total_duplicates = 0usize;
    let mut partial_failures = 0usize;

    for (index, path) in archives.iter().enumerate() {
        let payload = read_payload(path, index as i64 + 1)?;
        let batch = pipeline.process(&payload);

        report_diagnostics(&batch);

        let written = sink.append(&batch.rows())?;
        total_accepted += written;
        total_duplicates += batch.duplicates_filtered;
        if batch.state == RunState::PartialFailure {
            partial_failures += 1;
        }

        println!(
            "{}: {} records, {} duplicates filtered ({})",
            batch.archive_filename,
            batch.records.len(),
            batch.duplicates_filtered,
            batch.state
        );

        if !cli.keep_spool {
            move_to_processed(path, &cli.processed)?;
        }
    }

    println!(
        "done: {} archives, {} records appended to {}, {} duplicates filtered, {} partial failures",
        archives.len(),
        total_accepted,
        cli.output.display(),
        total_duplicates,
        partial_failures
    );

    Ok(())
}

/// Archive files in the spool directory, in name order for a stable run
fn spool_archives(spool: &Path) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();

    for entry in fs::read_dir(spool)
        .with_context(|| format!("reading spool directory {}", spool.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if has_archive_extension(&name) {
            archives.push(entry.path());
        }
    }

    archives.sort();
    Ok(archives)
}

/// Build the pipeline payload for one spooled archive.
///
/// The file's modification time stands in for the upstream delivery
/// timestamp, the scan position for the message id.
fn read_payload(path: &Path, message_id: i64) -> Result<ArchivePayload> {
    let bytes =
        fs::read(path).with_context(|| format!("reading archive {}", path.display()))?;

    let received_at: DateTime<Utc> = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ArchivePayload::new(filename, bytes, message_id, received_at))
}

/// Surface every batch diagnostic in the log
fn report_diagnostics(batch: &Batch) {
    for diag in &batch.diagnostics {
        let path = diag.inner_path.as_deref().unwrap_or("-");
        let detail = diag.detail.as_deref().unwrap_or("");
        warn!(
            "{}: [{}] {} {} {}",
            batch.archive_filename, diag.stage, diag.reason, path, detail
        );
    }
}

/// Move a fully processed archive out of the spool
fn move_to_processed(path: &Path, processed: &Path) -> Result<()> {
    let Some(name) = path.file_name() else {
        return Ok(());
    };
    let target = processed.join(name);
    fs::rename(path, &target)
        .with_context(|| format!("moving {} to {}", path.display(), target.display()))?;
    info!("moved {} to {}", path.display(), target.display());
    Ok(())
}
