//! # edgequake-md2pdf
//!
//! Batch-convert a directory of Markdown files to PDF by driving an external
//! converter (`pandoc` by default).
//!
//! The crate does no Markdown or PDF work itself. It finds the sources,
//! prepares the output directory, runs the converter once per file, and
//! tells you exactly which files made it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source dir
//!  │
//!  ├─ 1. Prepare   create generated-pdfs/ (idempotent)
//!  ├─ 2. Discover  non-recursive *.md match, case-sensitive
//!  ├─ 3. Invoke    pandoc <src> -o generated-pdfs/<stem>.pdf, one at a time
//!  └─ 4. Report    Converted <name> / per-file error + batch stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{convert_batch, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder().source_dir("docs").build()?;
//!     let output = convert_batch(&config).await?;
//!     for file in &output.files {
//!         match &file.error {
//!             None => println!("Converted {}", file.file_name),
//!             Some(e) => eprintln!("Failed {}: {e}", file.file_name),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, FileOrder, ReportPolicy};
pub use convert::{convert_batch, convert_batch_sync, convert_file, plan};
pub use error::{BatchError, FileError};
pub use output::{BatchOutput, BatchStats, FileResult};
pub use pipeline::discover::{list_source_files, SourcePattern};
pub use pipeline::invoke::{convert, destination_for, ConversionJob};
pub use pipeline::prepare::ensure_output_directory;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, FileStream};
