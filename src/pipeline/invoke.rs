//! Converter invocation: run the external tool for one source file.
//!
//! The calling convention is `<converter> [args...] <source> -o <destination>`.
//! The child is awaited before [`convert`] returns, so no process handle
//! outlives the call and two conversions never overlap.
//!
//! Child stdout and stderr are piped rather than inherited. Converter chatter
//! would otherwise interleave with the `Converted <name>` status lines; stdout
//! goes to the DEBUG log and the tail of stderr is kept for the error report.

use crate::config::{BatchConfig, ReportPolicy};
use crate::error::{BatchError, FileError};
use crate::output::FileResult;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Instant;
use tempfile::TempPath;
use tokio::process::Command;
use tracing::{debug, warn};

/// Longest stderr excerpt kept in a [`FileError::ConverterFailed`].
const STDERR_TAIL_BYTES: usize = 2000;

/// One planned conversion: a source file and where its PDF goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub file_name: String,
    /// Earlier source in the same batch that already writes `destination`.
    pub conflicts_with: Option<String>,
}

impl ConversionJob {
    /// Plan the conversion of `source` into `destination_dir`.
    pub fn new(source: impl Into<PathBuf>, destination_dir: &Path) -> Self {
        let source = source.into();
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        let destination = destination_for(&source, destination_dir);
        Self {
            source,
            destination,
            file_name,
            conflicts_with: None,
        }
    }

    /// Arguments passed to the converter when it writes to `target`.
    pub fn args(&self, config: &BatchConfig, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = config.converter_args.iter().map(OsString::from).collect();
        args.push(self.source.clone().into_os_string());
        args.push(OsString::from("-o"));
        args.push(target.as_os_str().to_os_string());
        args
    }

    /// Human-readable command line, for dry runs and logs.
    pub fn command_line(&self, config: &BatchConfig) -> String {
        std::iter::once(OsString::from(&config.converter))
            .chain(self.args(config, &self.destination))
            .map(|a| shell_quote(&a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `destination_dir / <source stem>.pdf`.
pub fn destination_for(source: &Path, destination_dir: &Path) -> PathBuf {
    let mut name = source
        .file_stem()
        .or_else(|| source.file_name())
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".pdf");
    destination_dir.join(name)
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Run the converter for one job and wait for it to exit.
///
/// ## Return Value
///
/// A converter that cannot be found is fatal (`Err(ConverterNotFound)`):
/// every remaining file would fail the same way. Everything else that can go
/// wrong with a single file is captured in `FileResult::error` so the batch
/// can move on.
pub async fn convert(job: &ConversionJob, config: &BatchConfig) -> Result<FileResult, BatchError> {
    let start = Instant::now();

    if let Some(ref claimed_by) = job.conflicts_with {
        return Ok(failed(
            job,
            start,
            None,
            FileError::DestinationConflict {
                file: job.file_name.clone(),
                destination: job.destination.clone(),
                claimed_by: claimed_by.clone(),
            },
        ));
    }

    let temp = if config.atomic_writes {
        match temp_target(&job.destination) {
            Ok(t) => Some(t),
            Err(e) => {
                return Ok(failed(
                    job,
                    start,
                    None,
                    FileError::PersistFailed {
                        file: job.file_name.clone(),
                        detail: format!("could not create temporary file: {e}"),
                    },
                ))
            }
        }
    } else {
        None
    };
    let target: PathBuf = temp
        .as_ref()
        .map(|t| t.to_path_buf())
        .unwrap_or_else(|| job.destination.clone());

    debug!("Running: {}", job.command_line(config));

    let output = Command::new(&config.converter)
        .args(job.args(config, &target))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BatchError::ConverterNotFound {
                converter: config.converter.clone(),
            })
        }
        Err(e) => {
            return Ok(failed(
                job,
                start,
                None,
                FileError::SpawnFailed {
                    file: job.file_name.clone(),
                    detail: e.to_string(),
                },
            ))
        }
    };

    if !output.stdout.is_empty() {
        debug!(
            "{} stdout: {}",
            config.converter,
            String::from_utf8_lossy(&output.stdout).trim_end()
        );
    }

    let exit_code = output.status.code();
    let error = match config.report {
        ReportPolicy::Verified => verify(job, &target, temp.is_some(), &output).await,
        ReportPolicy::Optimistic => {
            if !output.status.success() {
                debug!(
                    "Ignoring {} exit status {:?} for {}",
                    config.converter, exit_code, job.file_name
                );
            }
            None
        }
    };

    // Whatever the report policy, a temp file only replaces the destination
    // after a clean exit.
    let error = match (error, temp) {
        (None, Some(temp)) if output.status.success() => persist(job, temp).await,
        (None, Some(_discarded)) => {
            debug!("Discarding partial output for {}", job.file_name);
            None
        }
        (error, _) => error,
    };

    Ok(FileResult {
        source: job.source.clone(),
        destination: job.destination.clone(),
        file_name: job.file_name.clone(),
        exit_code,
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    })
}

/// A temporary `.pdf` next to the destination; removed on drop.
fn temp_target(destination: &Path) -> std::io::Result<TempPath> {
    let dir = destination.parent().unwrap_or_else(|| Path::new("."));
    let file = tempfile::Builder::new()
        .prefix(".md2pdf-")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

/// Check the exit status and that the converter actually wrote a PDF.
async fn verify(
    job: &ConversionJob,
    target: &Path,
    pre_created: bool,
    output: &Output,
) -> Option<FileError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Some(FileError::ConverterFailed {
            file: job.file_name.clone(),
            code: output.status.code(),
            stderr: tail(stderr.trim_end(), STDERR_TAIL_BYTES).to_string(),
        });
    }

    // A pre-created temp file exists from the start; only content counts.
    let written = match tokio::fs::metadata(target).await {
        Ok(meta) => meta.is_file() && (!pre_created || meta.len() > 0),
        Err(_) => false,
    };
    if written {
        None
    } else {
        Some(FileError::OutputMissing {
            file: job.file_name.clone(),
            destination: job.destination.clone(),
        })
    }
}

/// Move a finished temp file over the destination.
async fn persist(job: &ConversionJob, temp: TempPath) -> Option<FileError> {
    let empty = tokio::fs::metadata(&*temp)
        .await
        .map(|m| m.len() == 0)
        .unwrap_or(true);
    if empty {
        warn!("{} produced no output; leaving destination untouched", job.file_name);
        return None;
    }

    let destination = job.destination.clone();
    let file = job.file_name.clone();
    let moved = tokio::task::spawn_blocking(move || temp.persist(&destination))
        .await
        .map_err(|e| format!("persist task panicked: {e}"))
        .and_then(|r| r.map_err(|e| e.error.to_string()));

    moved
        .err()
        .map(|detail| FileError::PersistFailed { file, detail })
}

fn failed(job: &ConversionJob, start: Instant, exit_code: Option<i32>, error: FileError) -> FileResult {
    FileResult {
        source: job.source.clone(),
        destination: job.destination.clone(),
        file_name: job.file_name.clone(),
        exit_code,
        duration_ms: start.elapsed().as_millis() as u64,
        error: Some(error),
    }
}

/// The last `max` bytes of `s`, cut on a char boundary.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut i = s.len() - max;
    while !s.is_char_boundary(i) {
        i += 1;
    }
    &s[i..]
}
