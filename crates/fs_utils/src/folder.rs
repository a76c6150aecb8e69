//! Top-level folder checks and content-only cleanup.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::spec::{FsUtilsError, Result};

/// Whether the directory at `path` has no entries. Non-recursive.
pub fn is_folder_empty<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    let mut iter_entries = fs::read_dir(path).map_err(|e| FsUtilsError::io(path, e))?;
    match iter_entries.next() {
        None => Ok(true),
        Some(Ok(_)) => Ok(false),
        Some(Err(e)) => Err(FsUtilsError::io(path, e)),
    }
}

/// Remove every file and folder inside `path`, keeping `path` itself.
///
/// Useful when the folder carries permissions worth keeping, or when only
/// its contents may be modified. Symlinks are removed, never followed.
/// Entries removed before a failure stay removed.
pub fn cleanup_folder<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let iter_entries = fs::read_dir(path).map_err(|e| FsUtilsError::io(path, e))?;

    let mut cnt_removed = 0_u64;
    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| FsUtilsError::io(path, e))?;
        let path_entry = entry.path();
        let cfg_file_type = entry
            .file_type()
            .map_err(|e| FsUtilsError::io(&path_entry, e))?;

        let res_remove = if cfg_file_type.is_dir() {
            fs::remove_dir_all(&path_entry)
        } else {
            remove_non_directory(&path_entry, cfg_file_type)
        };
        res_remove.map_err(|e| FsUtilsError::io(&path_entry, e))?;
        cnt_removed += 1;
    }

    debug!(path = %path.display(), cnt_removed, "cleanup_folder done");
    Ok(())
}

#[cfg(windows)]
fn remove_non_directory(path_entry: &Path, cfg_file_type: fs::FileType) -> std::io::Result<()> {
    use std::os::windows::fs::FileTypeExt;
    if cfg_file_type.is_symlink_dir() {
        return fs::remove_dir(path_entry);
    }
    fs::remove_file(path_entry)
}

#[cfg(not(windows))]
fn remove_non_directory(path_entry: &Path, _cfg_file_type: fs::FileType) -> std::io::Result<()> {
    fs::remove_file(path_entry)
}
