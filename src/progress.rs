//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the batch walks through each source file. The CLI uses this hook to
//! print its `Converted <name>` status lines; library callers can forward the
//! same events to a channel, a log, or a UI.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{BatchConfig, ConversionProgressCallback, FileResult};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, result: &FileResult) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{index}/{total}] {}", result.file_name);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { converted: AtomicUsize::new(0) });
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::FileResult;
use std::sync::Arc;

/// Called by the batch driver as it processes each file.
///
/// Implementations must be `Send + Sync` so a config carrying one can move
/// across tasks. All methods have default no-op implementations so callers
/// only override what they care about.
///
/// Files are processed strictly one at a time; `index` is 1-based.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after discovery, before the first converter runs.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before the converter is spawned for a file.
    fn on_file_start(&self, index: usize, total_files: usize, file_name: &str) {
        let _ = (index, total_files, file_name);
    }

    /// Called when a file is reported as converted.
    fn on_file_complete(&self, index: usize, total_files: usize, result: &FileResult) {
        let _ = (index, total_files, result);
    }

    /// Called when a file failed. `result.error` is always `Some`.
    fn on_file_error(&self, index: usize, total_files: usize, result: &FileResult) {
        let _ = (index, total_files, result);
    }

    /// Called once after every file has been attempted.
    ///
    /// Not called when the batch aborts with a fatal error.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
