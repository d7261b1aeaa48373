//! Batch reconstruction over mirrored source directories.
//!
//! The tables, key-value and lines directories share one layout: every
//! `sub/name.json` under the tables directory has a counterpart at the same
//! relative path in the other two. Results land in
//! `output/sub/name/combined_structured_data.json` next to
//! `merged_fragments.json`.

use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::Reconstructor;
use crate::error::{Error, Result};
use crate::model::ReconstructionStats;
use crate::render::{merged_to_json, records_to_json, write_json, JsonFormat};
use crate::source::SourceSet;

/// Name of the attributed output file.
pub const COMBINED_FILE: &str = "combined_structured_data.json";

/// Name of the merged-fragments output file.
pub const MERGED_FILE: &str = "merged_fragments.json";

/// Default number of documents processed at once.
pub const DEFAULT_JOBS: usize = 4;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root of the table detections
    pub tables_dir: PathBuf,

    /// Root of the key-value detections
    pub kv_dir: PathBuf,

    /// Root of the OCR lines
    pub lines_dir: PathBuf,

    /// Where results are written
    pub output_dir: PathBuf,

    /// Documents processed concurrently
    pub jobs: usize,

    /// Output JSON format
    pub format: JsonFormat,
}

impl BatchOptions {
    /// Create options for the given directories.
    pub fn new(
        tables_dir: impl Into<PathBuf>,
        kv_dir: impl Into<PathBuf>,
        lines_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tables_dir: tables_dir.into(),
            kv_dir: kv_dir.into(),
            lines_dir: lines_dir.into(),
            output_dir: output_dir.into(),
            jobs: DEFAULT_JOBS,
            format: JsonFormat::Pretty,
        }
    }

    /// Set the number of concurrent documents (at least one).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the output JSON format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Output directory for a document at `relative` under the tables root.
    pub fn output_dir_for(&self, relative: &Path) -> PathBuf {
        let stem = relative.file_stem().unwrap_or(relative.as_os_str());
        match relative.parent() {
            Some(parent) => self.output_dir.join(parent).join(stem),
            None => self.output_dir.join(stem),
        }
    }
}

/// Result of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// Path relative to the tables root
    pub relative_path: PathBuf,

    /// Directory the outputs were written to
    pub output_dir: PathBuf,

    /// Counters when the document was reconstructed
    pub stats: Option<ReconstructionStats>,

    /// Pages that failed inside an otherwise reconstructed document
    pub page_failures: usize,

    /// Error message when the whole document failed
    pub error: Option<String>,
}

impl DocumentOutcome {
    /// Check if the document was reconstructed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Progress notifications published during a batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Source files were discovered
    Discovered(usize),
    /// A document is being processed
    Started(PathBuf),
    /// A document finished, successfully or not
    Finished(DocumentOutcome),
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per discovered document, sorted by path
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    /// Documents that were reconstructed.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Documents that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Counters merged over every successful document.
    pub fn stats(&self) -> ReconstructionStats {
        let mut total = ReconstructionStats::new();
        for stats in self.outcomes.iter().filter_map(|o| o.stats.as_ref()) {
            total.merge(stats);
        }
        total
    }
}

/// Find every `*.json` file under `root`, relative to it, sorted.
pub fn discover_sources<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }

    let pattern = format!("{}/**/*.json", glob::Pattern::escape(&root.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .map_err(|e| Error::Other(format!("invalid source pattern {}: {}", pattern, e)))?;

    let mut found = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                if let Ok(relative) = path.strip_prefix(root) {
                    found.push(relative.to_path_buf());
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable entry: {}", e),
        }
    }
    found.sort();
    Ok(found)
}

/// Reconstruct every document under `options.tables_dir`.
///
/// A failing document never stops the others; its error is kept in its
/// [`DocumentOutcome`].
pub fn run_batch(
    options: &BatchOptions,
    reconstructor: &Reconstructor,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport> {
    let sources = discover_sources(&options.tables_dir)?;
    log::info!(
        "Found {} documents under {}",
        sources.len(),
        options.tables_dir.display()
    );
    send(&events, BatchEvent::Discovered(sources.len()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.max(1))
        .build()
        .map_err(|e| Error::Other(format!("failed to build thread pool: {}", e)))?;

    let mut outcomes: Vec<DocumentOutcome> = pool.install(|| {
        sources
            .par_iter()
            .map(|relative| {
                send(&events, BatchEvent::Started(relative.clone()));
                let outcome = process_document(options, reconstructor, relative);
                send(&events, BatchEvent::Finished(outcome.clone()));
                outcome
            })
            .collect()
    });
    outcomes.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let report = BatchReport { outcomes };
    log::info!(
        "Batch finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

/// Reconstruct one document and write its outputs.
pub fn process_document(
    options: &BatchOptions,
    reconstructor: &Reconstructor,
    relative: &Path,
) -> DocumentOutcome {
    let output_dir = options.output_dir_for(relative);
    let mut outcome = DocumentOutcome {
        relative_path: relative.to_path_buf(),
        output_dir: output_dir.clone(),
        stats: None,
        page_failures: 0,
        error: None,
    };

    let result = SourceSet::from_paths(
        options.tables_dir.join(relative),
        options.kv_dir.join(relative),
        options.lines_dir.join(relative),
    )
    .and_then(|source| {
        let report = reconstructor.reconstruct(&source);
        write_json(
            output_dir.join(COMBINED_FILE),
            &records_to_json(&report, options.format)?,
        )?;
        write_json(
            output_dir.join(MERGED_FILE),
            &merged_to_json(&report, options.format)?,
        )?;
        Ok(report)
    });

    match result {
        Ok(report) => {
            log::info!(
                "Processed {} ({} pages) -> {}",
                relative.display(),
                report.stats.pages,
                output_dir.display()
            );
            outcome.page_failures = report.failures.len();
            outcome.stats = Some(report.stats);
        }
        Err(err) => {
            log::warn!("Failed to process {}: {}", relative.display(), err);
            outcome.error = Some(err.to_string());
        }
    }
    outcome
}

fn send(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(event);
    }
}
