//! Pipeline stages for batch Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ prepare ──▶ invoke (one file at a time)
//! (*.md glob)  (mkdir -p)  (<converter> src -o dst)
//! ```
//!
//! 1. [`discover`]: list matching files in the source directory
//! 2. [`prepare`]: create the output directory if it is missing
//! 3. [`invoke`]: run the external converter for a single file and
//!    classify the outcome

pub mod discover;
pub mod invoke;
pub mod prepare;
