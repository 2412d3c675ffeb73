//! Output directory preparation

use crate::error::ScenarioError;
use std::io::ErrorKind;
use std::path::Path;

/// Create `path` (and missing parents) unless it already exists as a directory
///
/// An existing directory is success. Any other failure, including a regular
/// file occupying `path`, is reported.
///
/// # Errors
/// - `ScenarioError::Directory` if the directory cannot be created
pub fn ensure_dir(path: &Path) -> Result<(), ScenarioError> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(ScenarioError::Directory {
            path: path.to_path_buf(),
            source,
        }),
    }
}
