//! Error types for the edgequake-md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`]: **Fatal**: the batch cannot proceed at all (source
//!   directory missing, output directory cannot be created, converter binary
//!   not installed). Returned as `Err(BatchError)` from the top-level
//!   `convert*` functions.
//!
//! * [`FileError`]: **Non-fatal**: a single file failed to convert (bad
//!   Markdown, converter crashed) but the remaining files are unaffected.
//!   Stored inside [`crate::output::FileResult`] so callers can inspect
//!   partial success rather than losing the whole batch to one bad file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-md2pdf library.
///
/// File-level failures use [`FileError`] and are stored in
/// [`crate::output::FileResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// The source directory does not exist.
    #[error("Source directory not found: '{path}'\nCheck the path exists and is readable.")]
    SourceDirNotFound { path: PathBuf },

    /// The source path exists but is a file, not a directory.
    #[error("Source path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Process does not have read permission on the source directory.
    #[error("Permission denied reading '{path}'\nTry: chmod +rx {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Enumerating the source directory failed midway.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file-name pattern could not be compiled.
    #[error("Invalid source pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory (or it exists as a file).
    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The converter binary could not be found on `PATH`.
    #[error(
        "Converter '{converter}' was not found.\n\
Install it (e.g. https://pandoc.org/installing.html) or point --converter at an existing binary."
    )]
    ConverterNotFound { converter: String },

    /// A file failed and the batch was configured to stop at the first failure.
    #[error("Aborting batch: {error}")]
    FileFailed { error: FileError },

    /// Some files converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchOutput::into_result`] when the
    /// caller wants to treat any file failure as an error.
    #[error("{failed}/{total} files failed to convert")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single source file.
///
/// Stored in [`crate::output::FileResult`] when a conversion fails.
/// The batch continues unless `fail_fast` is set.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The converter process could not be started.
    #[error("{file}: failed to start converter: {detail}")]
    SpawnFailed { file: String, detail: String },

    /// The converter ran but exited unsuccessfully.
    #[error("{file}: converter exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    ConverterFailed {
        file: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The converter reported success but the PDF was never written.
    #[error("{file}: converter succeeded but '{destination}' was not written")]
    OutputMissing { file: String, destination: PathBuf },

    /// Moving the finished PDF into place failed (atomic writes only).
    #[error("{file}: failed to move PDF into place: {detail}")]
    PersistFailed { file: String, detail: String },

    /// Another source earlier in the batch already maps to the same PDF.
    #[error("{file}: skipped, '{destination}' is already produced from {claimed_by}")]
    DestinationConflict {
        file: String,
        destination: PathBuf,
        claimed_by: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
