use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::spec::{FsUtilsError, Result};

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Final normal component of `path`, or `None` for empty paths, roots,
/// prefixes and paths ending in `..`.
pub(crate) fn basename(path: &Path) -> Option<&OsStr> {
    match path.components().next_back()? {
        Component::Normal(name) => Some(name),
        _ => None,
    }
}

/// Derive `path_dir_dst_parent / basename(path_dir_src)`.
pub(crate) fn derive_destination_path(
    path_dir_src: &Path,
    path_dir_dst_parent: &Path,
) -> Result<PathBuf> {
    if path_dir_dst_parent.as_os_str().is_empty() {
        return Err(FsUtilsError::InvalidPath(
            "Destination parent directory is empty.".to_string(),
        ));
    }
    let name_dir = basename(path_dir_src).ok_or_else(|| {
        FsUtilsError::InvalidPath(format!(
            "Failed to derive basename of source directory: `{}`",
            path_dir_src.display()
        ))
    })?;
    Ok(path_dir_dst_parent.join(name_dir))
}

fn _is_relative_to_base(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonicalize the longest existing prefix of `path` and re-attach the rest.
fn _normalize_path(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut path_cursor = path_abs.as_path();
    let mut l_names_tail: Vec<&OsStr> = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_cursor) {
            return l_names_tail
                .iter()
                .rev()
                .fold(resolved, |acc, name| acc.join(name));
        }
        match (path_cursor.parent(), path_cursor.file_name()) {
            (Some(parent), Some(name)) => {
                l_names_tail.push(name);
                path_cursor = parent;
            }
            _ => return path_abs.clone(),
        }
    }
}

/// Whether `path_dir_dst` (which need not exist yet) lands inside `path_dir_src`.
pub(crate) fn is_destination_inside_source(path_dir_src: &Path, path_dir_dst: &Path) -> bool {
    _is_relative_to_base(&_normalize_path(path_dir_dst), &_normalize_path(path_dir_src))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EntryCopy

/// Identity used to detect a directory revisited through a symlink.
#[cfg(unix)]
pub(crate) fn dir_identity(meta: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
pub(crate) fn dir_identity(_meta: &fs::Metadata) -> Option<(u64, u64)> {
    None
}

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let target = fs::read_link(path_src)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// Copy file bytes verbatim; returns the number of bytes written.
///
/// Permissions follow `fs::copy`. Timestamps are copied only when
/// `if_keep_times` is set.
pub(crate) fn copy_file_contents(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_keep_times: bool,
) -> io::Result<u64> {
    let n_bytes = fs::copy(path_file_src, path_file_dst)?;
    if if_keep_times {
        apply_file_times(path_file_src, path_file_dst)?;
    }
    Ok(n_bytes)
}

fn apply_file_times(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
