//! Bounded reads of a file prefix, as bytes or as lossily decoded text.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::trace;

use crate::spec::{FsUtilsError, Result, SpecByteWindow};

/// Read at most `limit` leading bytes of `path`.
///
/// `if_truncated` is set when at least one more byte follows the window. The
/// check reads past the limit instead of trusting the reported file size, so
/// it also holds for pseudo files whose metadata length is zero.
pub fn read_head_bytes<P: AsRef<Path>>(path: P, limit: usize) -> Result<SpecByteWindow> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| FsUtilsError::io(path, e))?;

    let n_hint = file
        .metadata()
        .map(|meta| usize::try_from(meta.len()).unwrap_or(usize::MAX))
        .unwrap_or(0);
    let mut bytes = Vec::with_capacity(n_hint.min(limit));
    file.by_ref()
        .take(limit as u64)
        .read_to_end(&mut bytes)
        .map_err(|e| FsUtilsError::io(path, e))?;

    let if_truncated = bytes.len() == limit
        && has_more_bytes(&mut file).map_err(|e| FsUtilsError::io(path, e))?;
    trace!(
        path = %path.display(),
        limit,
        n_bytes = bytes.len(),
        if_truncated,
        "head read"
    );
    Ok(SpecByteWindow {
        bytes,
        if_truncated,
    })
}

fn has_more_bytes(file: &mut File) -> io::Result<bool> {
    let mut probe = [0_u8; 1];
    loop {
        match file.read(&mut probe) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Read the first `limit` bytes from a file, like `head -c limit`.
pub fn head<P: AsRef<Path>>(path: P, limit: usize) -> Result<Vec<u8>> {
    read_head_bytes(path, limit).map(SpecByteWindow::into_bytes)
}

/// Read the first `limit` bytes from a file as text.
///
/// Invalid UTF-8, including a multi-byte character cut by the limit, is
/// replaced with U+FFFD (one per maximal invalid subsequence).
pub fn head_to_string<P: AsRef<Path>>(path: P, limit: usize) -> Result<String> {
    head_to_string_with_message(path, limit, "")
}

/// Same as [`head_to_string`], appending `truncation_message` verbatim when
/// the file is longer than `limit` bytes.
///
/// # Examples
/// ```no_run
/// let txt = fs_utils::head_to_string_with_message("notes.txt", 5, " [cut]").unwrap();
/// ```
pub fn head_to_string_with_message<P: AsRef<Path>>(
    path: P,
    limit: usize,
    truncation_message: &str,
) -> Result<String> {
    let window = read_head_bytes(path, limit)?;
    Ok(decode_byte_window(&window, Some(truncation_message)))
}

/// Decode a window to UTF-8 with replacement characters, then append
/// `truncation_message` if the window was truncated.
pub fn decode_byte_window(window: &SpecByteWindow, truncation_message: Option<&str>) -> String {
    let mut txt = String::from_utf8_lossy(&window.bytes).into_owned();
    if window.if_truncated
        && let Some(msg) = truncation_message
    {
        txt.push_str(msg);
    }
    txt
}
