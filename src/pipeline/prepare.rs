//! Output preparation: make sure the destination directory exists.

use crate::error::BatchError;
use std::path::Path;
use tracing::debug;

/// Create `path` and any missing parents.
///
/// An existing directory is left untouched, including any files already in
/// it. Fails if `path` exists but is not a directory.
pub async fn ensure_output_directory(path: &Path) -> Result<(), BatchError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| BatchError::OutputDirFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("Output directory ready: {}", path.display());
    Ok(())
}
