//! Eager (whole-batch) conversion entry points.
//!
//! [`convert_batch`] converts every matching file and returns once the last
//! one is done. Use [`crate::stream::convert_stream`] instead to observe
//! results one file at a time.

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::output::{BatchOutput, BatchStats, FileResult};
use crate::pipeline::discover::{self, SourcePattern};
use crate::pipeline::invoke::{self, ConversionJob};
use crate::pipeline::prepare;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every matching Markdown file in `config.source_dir` to PDF.
///
/// Files are converted strictly one after another in discovery order.
///
/// # Returns
/// `Ok(BatchOutput)` once every file has been attempted, even if some
/// failed (check `output.stats.failed`, or call
/// [`BatchOutput::into_result`]).
///
/// # Errors
/// Returns `Err(BatchError)` only for fatal errors:
/// - Source directory missing or unreadable
/// - Output directory cannot be created
/// - Converter binary not found
/// - A file failed while `fail_fast` is set
pub async fn convert_batch(config: &BatchConfig) -> Result<BatchOutput, BatchError> {
    let total_start = Instant::now();
    let pattern = SourcePattern::new(&config.pattern, config.case_insensitive)?;
    let output_dir = config.resolved_output_dir();
    info!(
        "Starting batch: {} ({}) → {}",
        config.source_dir.display(),
        pattern.as_str(),
        output_dir.display()
    );

    // ── Step 1: Output directory ─────────────────────────────────────────
    // Source must exist before mkdir -p can create it as the output's parent.
    discover::check_source_dir(&config.source_dir).await?;
    prepare::ensure_output_directory(&output_dir).await?;

    // ── Step 2: Discover sources ─────────────────────────────────────────
    let jobs = discover_jobs(config, &pattern, &output_dir).await?;
    let total = jobs.len();
    info!("Found {} source file(s)", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 3: Convert, one file at a time ──────────────────────────────
    let mut files = Vec::with_capacity(total);
    for (i, job) in jobs.iter().enumerate() {
        let result = run_job(i + 1, total, job, config).await?;
        if config.fail_fast {
            if let Some(ref error) = result.error {
                return Err(BatchError::FileFailed {
                    error: error.clone(),
                });
            }
        }
        files.push(result);
    }

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let stats = BatchStats::from_results(total, &files, total_start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} converted, {}ms total",
        stats.converted, total, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.converted);
    }

    Ok(BatchOutput {
        output_dir,
        files,
        stats,
    })
}

/// Synchronous wrapper around [`convert_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_batch_sync(config: &BatchConfig) -> Result<BatchOutput, BatchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BatchError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_batch(config))
}

/// Convert a single Markdown file into `destination_dir`.
///
/// The destination directory must already exist; see
/// [`crate::pipeline::prepare::ensure_output_directory`]. No progress
/// callbacks fire.
pub async fn convert_file(
    source: impl AsRef<Path>,
    destination_dir: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<FileResult, BatchError> {
    let job = ConversionJob::new(source.as_ref(), destination_dir.as_ref());
    invoke::convert(&job, config).await
}

/// List the conversions a batch would run, without writing anything.
///
/// Neither creates the output directory nor spawns the converter.
pub async fn plan(config: &BatchConfig) -> Result<Vec<ConversionJob>, BatchError> {
    let pattern = SourcePattern::new(&config.pattern, config.case_insensitive)?;
    discover_jobs(config, &pattern, &config.resolved_output_dir()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Plan one job per source. A job whose PDF an earlier job already claims
/// is marked as conflicting and will not run.
pub(crate) async fn discover_jobs(
    config: &BatchConfig,
    pattern: &SourcePattern,
    output_dir: &Path,
) -> Result<Vec<ConversionJob>, BatchError> {
    let sources = discover::list_source_files(&config.source_dir, pattern, config.order).await?;
    let mut claimed: HashMap<PathBuf, String> = HashMap::with_capacity(sources.len());
    Ok(sources
        .into_iter()
        .map(|source| {
            let mut job = ConversionJob::new(source, output_dir);
            match claimed.get(&job.destination) {
                Some(first) => {
                    warn!(
                        "{} and {} both map to {}; only {} is converted",
                        first,
                        job.file_name,
                        job.destination.display(),
                        first
                    );
                    job.conflicts_with = Some(first.clone());
                }
                None => {
                    claimed.insert(job.destination.clone(), job.file_name.clone());
                }
            }
            job
        })
        .collect())
}

/// Convert one job and fire the matching progress events.
pub(crate) async fn run_job(
    index: usize,
    total: usize,
    job: &ConversionJob,
    config: &BatchConfig,
) -> Result<FileResult, BatchError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(index, total, &job.file_name);
    }
    debug!("[{}/{}] {}", index, total, job.file_name);

    let result = invoke::convert(job, config).await?;

    match &result.error {
        None => {
            info!(
                "Converted {} → {} ({}ms)",
                job.file_name,
                job.destination.display(),
                result.duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_complete(index, total, &result);
            }
        }
        Some(e) => {
            warn!("{}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_error(index, total, &result);
            }
        }
    }

    Ok(result)
}
