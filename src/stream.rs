//! Streaming conversion API: emit one result per file as it completes.
//!
//! Unlike the eager [`crate::convert::convert_batch`], which returns only
//! after every file has been attempted, [`convert_stream`] yields each
//! `FileResult` as soon as its converter exits. Conversions stay sequential:
//! the next converter is spawned only when the stream is polled again.

use crate::config::BatchConfig;
use crate::convert::{discover_jobs, run_job};
use crate::error::BatchError;
use crate::output::FileResult;
use crate::pipeline::discover::{self, SourcePattern};
use crate::pipeline::prepare;
use futures::stream;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of file results.
pub type FileStream = Pin<Box<dyn Stream<Item = Result<FileResult, BatchError>> + Send>>;

/// Convert Markdown files to PDF, streaming one result per file.
///
/// The output directory is created and the source directory listed before
/// this returns, so setup failures surface as `Err` here. During iteration:
/// - `Ok(FileResult)`: one per attempted file (check `result.error`)
/// - `Err(BatchError)`: a fatal error such as a missing converter; it is
///   the last item the stream yields
///
/// With `fail_fast`, the stream ends right after the first failed file.
/// Per-file progress callbacks fire; batch-level ones do not.
///
/// # Example
/// ```rust,no_run
/// use edgequake_md2pdf::{convert_stream, BatchConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BatchConfig::builder().source_dir("docs").build()?;
/// let mut files = convert_stream(&config).await?;
/// while let Some(item) = files.next().await {
///     match item {
///         Ok(f) if f.is_success() => println!("Converted {}", f.file_name),
///         Ok(f) => eprintln!("Failed {}", f.file_name),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_stream(config: &BatchConfig) -> Result<FileStream, BatchError> {
    let pattern = SourcePattern::new(&config.pattern, config.case_insensitive)?;
    let output_dir = config.resolved_output_dir();
    info!(
        "Starting streaming batch: {} → {}",
        config.source_dir.display(),
        output_dir.display()
    );

    discover::check_source_dir(&config.source_dir).await?;
    prepare::ensure_output_directory(&output_dir).await?;
    let jobs = discover_jobs(config, &pattern, &output_dir).await?;
    let total = jobs.len();

    let state = (jobs.into_iter().enumerate(), config.clone(), false);
    let s = stream::unfold(state, move |(mut jobs, cfg, halted)| async move {
        if halted {
            return None;
        }
        let (i, job) = jobs.next()?;
        let item = run_job(i + 1, total, &job, &cfg).await;
        let halt = match &item {
            Err(_) => true,
            Ok(result) => cfg.fail_fast && !result.is_success(),
        };
        Some((item, (jobs, cfg, halt)))
    });

    Ok(Box::pin(s))
}
