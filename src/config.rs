//! Configuration types for batch Markdown-to-PDF conversion.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. The source directory is an explicit field rather
//! than the process working directory, so a batch is reproducible no matter
//! where it is launched from.

use crate::error::BatchError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default output directory name, relative to the source directory.
pub const DEFAULT_OUTPUT_DIR: &str = "generated-pdfs";

/// Default converter binary, looked up on `PATH`.
pub const DEFAULT_CONVERTER: &str = "pandoc";

/// Default source file pattern.
pub const DEFAULT_PATTERN: &str = "*.md";

/// Configuration for a batch conversion.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{BatchConfig, ReportPolicy};
///
/// let config = BatchConfig::builder()
///     .source_dir("docs")
///     .output_dir("build/pdf")
///     .converter_arg("--pdf-engine=xelatex")
///     .report(ReportPolicy::Verified)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory scanned (non-recursively) for source files. Default: `.`.
    pub source_dir: PathBuf,

    /// Where PDFs are written. Default: `generated-pdfs`.
    ///
    /// A relative path is resolved against `source_dir`; see
    /// [`BatchConfig::resolved_output_dir`].
    pub output_dir: PathBuf,

    /// File-name pattern selecting source files. Default: `*.md`.
    ///
    /// Supports `*` (any run of characters) and `?` (one character).
    pub pattern: String,

    /// Match `pattern` ignoring ASCII and Unicode case. Default: false.
    ///
    /// Matching is case-sensitive on every platform unless this is set, so
    /// `notes.MD` is skipped by `*.md` on macOS and Windows too.
    pub case_insensitive: bool,

    /// Converter binary name or path. Default: `pandoc`.
    pub converter: String,

    /// Extra arguments inserted between the binary and the source path.
    pub converter_args: Vec<String>,

    /// How file outcomes are reported. Default: [`ReportPolicy::Verified`].
    pub report: ReportPolicy,

    /// Order in which source files are converted. Default: [`FileOrder::Filesystem`].
    pub order: FileOrder,

    /// Stop the batch at the first failed file. Default: false.
    ///
    /// Only meaningful with [`ReportPolicy::Verified`]; optimistic reporting
    /// never observes per-file failures.
    pub fail_fast: bool,

    /// Write through a temporary file and rename on success. Default: false.
    ///
    /// When enabled the converter's `-o` argument is a temporary `.pdf` in the
    /// output directory, so a failed conversion never leaves a truncated PDF
    /// at the destination.
    pub atomic_writes: bool,

    /// Optional per-file progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pattern: DEFAULT_PATTERN.to_string(),
            case_insensitive: false,
            converter: DEFAULT_CONVERTER.to_string(),
            converter_args: Vec::new(),
            report: ReportPolicy::default(),
            order: FileOrder::default(),
            fail_fast: false,
            atomic_writes: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("source_dir", &self.source_dir)
            .field("output_dir", &self.output_dir)
            .field("pattern", &self.pattern)
            .field("case_insensitive", &self.case_insensitive)
            .field("converter", &self.converter)
            .field("converter_args", &self.converter_args)
            .field("report", &self.report)
            .field("order", &self.order)
            .field("fail_fast", &self.fail_fast)
            .field("atomic_writes", &self.atomic_writes)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// The output directory with relative paths anchored at `source_dir`.
    pub fn resolved_output_dir(&self) -> PathBuf {
        resolve_against(&self.source_dir, &self.output_dir)
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    pub fn case_insensitive(mut self, v: bool) -> Self {
        self.config.case_insensitive = v;
        self
    }

    pub fn converter(mut self, converter: impl Into<String>) -> Self {
        self.config.converter = converter.into();
        self
    }

    /// Append one extra converter argument.
    pub fn converter_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.converter_args.push(arg.into());
        self
    }

    /// Replace all extra converter arguments.
    pub fn converter_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.converter_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn report(mut self, policy: ReportPolicy) -> Self {
        self.config.report = policy;
        self
    }

    pub fn order(mut self, order: FileOrder) -> Self {
        self.config.order = order;
        self
    }

    pub fn fail_fast(mut self, v: bool) -> Self {
        self.config.fail_fast = v;
        self
    }

    pub fn atomic_writes(mut self, v: bool) -> Self {
        self.config.atomic_writes = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.converter.trim().is_empty() {
            return Err(BatchError::InvalidConfig(
                "Converter binary must not be empty".into(),
            ));
        }
        if c.pattern.is_empty() {
            return Err(BatchError::InvalidConfig(
                "Source pattern must not be empty".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Whether a file is reported as converted only after its success is verified.
///
/// | Policy | A file is "Converted" when… |
/// |--------|-----------------------------|
/// | `Verified` | the converter exited 0 and the PDF exists (default) |
/// | `Optimistic` | the converter process ran at all, whatever its exit status |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportPolicy {
    #[default]
    Verified,
    Optimistic,
}

/// Order in which matched source files are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileOrder {
    /// Whatever order the directory listing yields. (default)
    #[default]
    Filesystem,
    /// Sorted by file name, byte-wise.
    Name,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_conventions() {
        let c = BatchConfig::default();
        assert_eq!(c.source_dir, PathBuf::from("."));
        assert_eq!(c.output_dir, PathBuf::from("generated-pdfs"));
        assert_eq!(c.pattern, "*.md");
        assert_eq!(c.converter, "pandoc");
        assert!(c.converter_args.is_empty());
        assert_eq!(c.report, ReportPolicy::Verified);
        assert_eq!(c.order, FileOrder::Filesystem);
        assert!(!c.case_insensitive && !c.fail_fast && !c.atomic_writes);
    }

    #[test]
    fn relative_output_dir_is_anchored_at_source() {
        let c = BatchConfig::builder()
            .source_dir("/data/notes")
            .build()
            .unwrap();
        assert_eq!(
            c.resolved_output_dir(),
            PathBuf::from("/data/notes/generated-pdfs")
        );
    }

    #[test]
    fn absolute_output_dir_is_kept() {
        let out = std::env::temp_dir().join("md2pdf-out");
        let c = BatchConfig::builder()
            .source_dir("docs")
            .output_dir(&out)
            .build()
            .unwrap();
        assert_eq!(c.resolved_output_dir(), out);
    }

    #[test]
    fn converter_args_accumulate_and_replace() {
        let c = BatchConfig::builder()
            .converter_arg("--pdf-engine=xelatex")
            .converter_arg("-V")
            .build()
            .unwrap();
        assert_eq!(c.converter_args, vec!["--pdf-engine=xelatex", "-V"]);

        let c = BatchConfig::builder()
            .converter_arg("dropped")
            .converter_args(["--toc"])
            .build()
            .unwrap();
        assert_eq!(c.converter_args, vec!["--toc"]);
    }

    #[test]
    fn empty_converter_is_rejected() {
        let err = BatchConfig::builder().converter("  ").build().unwrap_err();
        assert!(matches!(err, BatchError::InvalidConfig(_)));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = BatchConfig::builder().pattern("").build().unwrap_err();
        assert!(matches!(err, BatchError::InvalidConfig(_)));
    }

    #[test]
    fn debug_hides_callback() {
        use crate::progress::NoopProgressCallback;
        use std::sync::Arc;

        let c = BatchConfig::builder()
            .progress_callback(Arc::new(NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn ConversionProgressCallback>"), "got: {dbg}");
    }
}
