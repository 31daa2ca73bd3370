//! Result types returned by the batch driver.

use crate::error::{BatchError, FileError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of converting one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Path of the Markdown source, as enumerated.
    pub source: PathBuf,
    /// Where the PDF was (or would have been) written.
    pub destination: PathBuf,
    /// Source file name, used in status lines (`Converted <file_name>`).
    pub file_name: String,
    /// Converter exit code; `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Wall-clock time spent in the converter.
    pub duration_ms: u64,
    /// Set when the file is reported as failed.
    pub error: Option<FileError>,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Source files matched by the pattern.
    pub discovered: usize,
    /// Files reported as converted.
    pub converted: usize,
    /// Files reported as failed.
    pub failed: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub(crate) fn from_results(discovered: usize, files: &[FileResult], total_ms: u64) -> Self {
        let converted = files.iter().filter(|f| f.is_success()).count();
        Self {
            discovered,
            converted,
            failed: files.len() - converted,
            total_duration_ms: total_ms,
        }
    }
}

/// Everything a completed batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// The resolved output directory.
    pub output_dir: PathBuf,
    /// Per-file results in conversion order.
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Treat any failed file as an error.
    pub fn into_result(self) -> Result<Self, BatchError> {
        if self.stats.failed == 0 {
            Ok(self)
        } else {
            Err(BatchError::PartialFailure {
                success: self.stats.converted,
                failed: self.stats.failed,
                total: self.files.len(),
            })
        }
    }

    /// Results for files that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| !f.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, error: Option<FileError>) -> FileResult {
        FileResult {
            source: PathBuf::from(name),
            destination: PathBuf::from("out").join(name.replace(".md", ".pdf")),
            file_name: name.to_string(),
            exit_code: Some(if error.is_some() { 1 } else { 0 }),
            duration_ms: 5,
            error,
        }
    }

    fn failed(name: &str) -> FileError {
        FileError::ConverterFailed {
            file: name.to_string(),
            code: Some(1),
            stderr: String::new(),
        }
    }

    #[test]
    fn stats_count_successes_and_failures() {
        let files = vec![file("a.md", None), file("b.md", Some(failed("b.md")))];
        let stats = BatchStats::from_results(2, &files, 42);
        assert_eq!(
            stats,
            BatchStats {
                discovered: 2,
                converted: 1,
                failed: 1,
                total_duration_ms: 42,
            }
        );
    }

    #[test]
    fn into_result_flags_partial_failure() {
        let files = vec![file("a.md", None), file("b.md", Some(failed("b.md")))];
        let out = BatchOutput {
            output_dir: PathBuf::from("out"),
            stats: BatchStats::from_results(2, &files, 0),
            files,
        };
        assert_eq!(out.failures().count(), 1);
        match out.into_result() {
            Err(BatchError::PartialFailure {
                success,
                failed,
                total,
            }) => assert_eq!((success, failed, total), (1, 1, 2)),
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn into_result_passes_clean_batch() {
        let files = vec![file("a.md", None)];
        let out = BatchOutput {
            output_dir: PathBuf::from("out"),
            stats: BatchStats::from_results(1, &files, 0),
            files,
        };
        assert!(out.into_result().is_ok());
    }

    #[test]
    fn file_result_serialises_to_json() {
        let json = serde_json::to_string(&file("b.md", Some(failed("b.md")))).unwrap();
        assert!(json.contains("\"file_name\":\"b.md\""), "got: {json}");
        assert!(json.contains("ConverterFailed"), "got: {json}");
    }
}
