//! Whole-file writes that never leave a half-written target behind.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Writes `contents` to a sibling temp file, then renames it over `path`.
///
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if any filesystem step fails.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    std::fs::write(&tmp, contents).map_err(|e| StoreError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
