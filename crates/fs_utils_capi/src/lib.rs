//! C ABI bridge over `fs_utils`.
//!
//! Every fallible call returns an [`FsUtilsResult`]. On `FS_UTILS_OK` the
//! `error` field is NULL; on `FS_UTILS_ERROR` the `buffer` field is NULL and
//! `error` holds a message. Owned outputs are released with `fs_utils_free`,
//! `fs_utils_free_bytes` or `fs_utils_result_free`.

use std::ffi::{CStr, CString, c_char, c_int};
use std::path::Path;

use fs_utils::{
    EnumCopySymlinkStrategy, SpecCopyDirOptions, cleanup_folder, copy_directory,
    copy_directory_with_options, destination_directory, head, head_to_string,
    head_to_string_with_message, is_folder_empty,
};

const N_BRIDGE_ABI_VERSION: u32 = 1;

/// Outcome discriminant of [`FsUtilsResult`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFsUtilsStatus {
    /// `FS_UTILS_OK` in the C header.
    Ok = 0,
    /// `FS_UTILS_ERROR` in the C header.
    Error = 1,
}

/// Tagged success/failure value returned across the C boundary.
#[repr(C)]
#[derive(Debug)]
pub struct FsUtilsResult {
    pub status: EnumFsUtilsStatus,
    /// Success payload; NULL for calls without a string output and on error.
    pub buffer: *mut c_char,
    /// Error message; NULL on success.
    pub error: *mut c_char,
}

impl FsUtilsResult {
    fn ok_empty() -> Self {
        Self {
            status: EnumFsUtilsStatus::Ok,
            buffer: std::ptr::null_mut(),
            error: std::ptr::null_mut(),
        }
    }

    fn ok(buffer: CString) -> Self {
        Self {
            status: EnumFsUtilsStatus::Ok,
            buffer: buffer.into_raw(),
            error: std::ptr::null_mut(),
        }
    }

    fn err(message: impl Into<String>) -> Self {
        let message = message.into().replace('\0', "\\0");
        Self {
            status: EnumFsUtilsStatus::Error,
            buffer: std::ptr::null_mut(),
            error: CString::new(message).unwrap_or_default().into_raw(),
        }
    }

    fn from_bytes(res: Result<Vec<u8>, String>) -> Self {
        match res.and_then(|raw| {
            CString::new(raw).map_err(|e| {
                format!(
                    "Output contains an interior NUL byte at position {}",
                    e.nul_position()
                )
            })
        }) {
            Ok(buffer) => Self::ok(buffer),
            Err(message) => Self::err(message),
        }
    }
}

/// Owned byte buffer returned by `fs_utils_head`.
#[repr(C)]
#[derive(Debug)]
pub struct FsUtilsBytes {
    pub data: *mut u8,
    pub length: usize,
}

impl FsUtilsBytes {
    fn from_vec(bytes: Vec<u8>) -> Self {
        let boxed = bytes.into_boxed_slice();
        let length = boxed.len();
        Self {
            data: Box::into_raw(boxed).cast::<u8>(),
            length,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region ArgParsing

/// # Safety
/// `ptr` must be NULL or point to a NUL-terminated string valid for `'a`.
unsafe fn parse_path<'a>(ptr: *const c_char, c_arg_name: &str) -> Result<&'a Path, String> {
    if ptr.is_null() {
        return Err(format!("Arg `{c_arg_name}` is null."));
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let raw = unsafe { CStr::from_ptr(ptr) };

    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        Ok(Path::new(OsStr::from_bytes(raw.to_bytes())))
    }
    #[cfg(not(unix))]
    {
        raw.to_str()
            .map(Path::new)
            .map_err(|_| format!("UTF-8 validation failed in `{c_arg_name}`."))
    }
}

/// # Safety
/// Same contract as [`parse_path`].
unsafe fn parse_str<'a>(ptr: *const c_char, c_arg_name: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("Arg `{c_arg_name}` is null."));
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| format!("UTF-8 validation failed in `{c_arg_name}`."))
}

fn parse_rule_symlink(value: &str) -> Result<EnumCopySymlinkStrategy, String> {
    match value {
        "dereference" => Ok(EnumCopySymlinkStrategy::Dereference),
        "copy_symlinks" => Ok(EnumCopySymlinkStrategy::CopySymlinks),
        "skip_symlinks" => Ok(EnumCopySymlinkStrategy::SkipSymlinks),
        _ => Err(format!(
            "Invalid symlink strategy: `{value}`. Expected one of: ['dereference', 'copy_symlinks', 'skip_symlinks']"
        )),
    }
}

/// Path bytes for the C side; raw OS bytes on unix, UTF-8 elsewhere.
fn path_into_bytes(path: &Path) -> Result<Vec<u8>, String> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Ok(path.as_os_str().as_bytes().to_vec())
    }
    #[cfg(not(unix))]
    {
        path.to_str()
            .map(|txt| txt.as_bytes().to_vec())
            .ok_or_else(|| format!("Path is not valid UTF-8: {}", path.display()))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Exports

/// ABI revision of this bridge.
#[unsafe(no_mangle)]
pub extern "C" fn fs_utils_abi_version() -> u32 {
    N_BRIDGE_ABI_VERSION
}

/// Checks if the given folder is empty; writes 1 or 0 to `is_empty`.
///
/// # Safety
/// `path` must be a NUL-terminated string; `is_empty` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_is_folder_empty(
    path: *const c_char,
    is_empty: *mut c_int,
) -> FsUtilsResult {
    if is_empty.is_null() {
        return FsUtilsResult::err("Arg `is_empty` is null.");
    }
    // SAFETY: forwarded caller contract.
    let path = match unsafe { parse_path(path, "path") } {
        Ok(v) => v,
        Err(message) => return FsUtilsResult::err(message),
    };
    match is_folder_empty(path) {
        Ok(b_is_empty) => {
            // SAFETY: checked non-null above; writable per caller contract.
            unsafe { *is_empty = c_int::from(b_is_empty) };
            FsUtilsResult::ok_empty()
        }
        Err(e) => FsUtilsResult::err(e.to_string()),
    }
}

/// Copies `source_dir` into a new `destination_dir/<basename>` directory and
/// returns that path in `buffer`. Refuses to run when that path exists.
///
/// # Safety
/// Both arguments must be NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_copy_directory(
    source_dir: *const c_char,
    destination_dir: *const c_char,
) -> FsUtilsResult {
    // SAFETY: forwarded caller contract.
    let res = unsafe { parse_path(source_dir, "source_dir") }.and_then(|path_dir_src| {
        // SAFETY: forwarded caller contract.
        let path_dir_dst_parent = unsafe { parse_path(destination_dir, "destination_dir") }?;
        let path_dir_dst =
            copy_directory(path_dir_src, path_dir_dst_parent).map_err(|e| e.to_string())?;
        path_into_bytes(&path_dir_dst)
    });
    FsUtilsResult::from_bytes(res)
}

/// Same as `fs_utils_copy_directory` with explicit options.
///
/// `rule_symlink` is one of `"dereference"`, `"copy_symlinks"`,
/// `"skip_symlinks"`; `depth_max` must be >= 1.
///
/// # Safety
/// String arguments must be NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_copy_directory_with_options(
    source_dir: *const c_char,
    destination_dir: *const c_char,
    rule_symlink: *const c_char,
    depth_max: usize,
    if_keep_times: bool,
) -> FsUtilsResult {
    let res = (|| -> Result<Vec<u8>, String> {
        // SAFETY: forwarded caller contract.
        let path_dir_src = unsafe { parse_path(source_dir, "source_dir") }?;
        // SAFETY: forwarded caller contract.
        let path_dir_dst_parent = unsafe { parse_path(destination_dir, "destination_dir") }?;
        // SAFETY: forwarded caller contract.
        let c_rule_symlink = unsafe { parse_str(rule_symlink, "rule_symlink") }?;
        let rule_symlink = parse_rule_symlink(c_rule_symlink)?;
        let spec_cp_options = SpecCopyDirOptions {
            rule_symlink,
            depth_max,
            if_keep_times,
        };
        let report =
            copy_directory_with_options(path_dir_src, path_dir_dst_parent, spec_cp_options)
                .map_err(|e| e.to_string())?;
        path_into_bytes(&report.path_dir_dst)
    })();
    FsUtilsResult::from_bytes(res)
}

/// Returns the destination `fs_utils_copy_directory` would write to.
/// Pure; the filesystem is not touched.
///
/// # Safety
/// Both arguments must be NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_destination_directory(
    source_dir: *const c_char,
    destination_dir: *const c_char,
) -> FsUtilsResult {
    // SAFETY: forwarded caller contract.
    let res = unsafe { parse_path(source_dir, "source_dir") }.and_then(|path_dir_src| {
        // SAFETY: forwarded caller contract.
        let path_dir_dst_parent = unsafe { parse_path(destination_dir, "destination_dir") }?;
        let path_dir_dst =
            destination_directory(path_dir_src, path_dir_dst_parent).map_err(|e| e.to_string())?;
        path_into_bytes(&path_dir_dst)
    });
    FsUtilsResult::from_bytes(res)
}

/// Reads the first `limit` bytes of a file into `out` (like `head -c`).
///
/// # Safety
/// `path` must be NUL-terminated; `out` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_head(
    path: *const c_char,
    limit: usize,
    out: *mut FsUtilsBytes,
) -> FsUtilsResult {
    if out.is_null() {
        return FsUtilsResult::err("Arg `out` is null.");
    }
    // SAFETY: forwarded caller contract.
    let path = match unsafe { parse_path(path, "path") } {
        Ok(v) => v,
        Err(message) => return FsUtilsResult::err(message),
    };
    match head(path, limit) {
        Ok(bytes) => {
            // SAFETY: checked non-null above; writable per caller contract.
            unsafe { out.write(FsUtilsBytes::from_vec(bytes)) };
            FsUtilsResult::ok_empty()
        }
        Err(e) => FsUtilsResult::err(e.to_string()),
    }
}

/// Reads the first `limit` bytes of a file as UTF-8 text; invalid
/// sequences become U+FFFD.
///
/// # Safety
/// `path` must be NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_head_to_string(
    path: *const c_char,
    limit: usize,
) -> FsUtilsResult {
    // SAFETY: forwarded caller contract.
    let res = unsafe { parse_path(path, "path") }
        .and_then(|path| {
            head_to_string(path, limit)
                .map(String::into_bytes)
                .map_err(|e| e.to_string())
        });
    FsUtilsResult::from_bytes(res)
}

/// Like `fs_utils_head_to_string`; appends `truncation_message` when the
/// file is longer than `limit` bytes.
///
/// # Safety
/// `path` and `truncation_message` must be NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_head_to_string_with_message(
    path: *const c_char,
    limit: usize,
    truncation_message: *const c_char,
) -> FsUtilsResult {
    let res = (|| -> Result<Vec<u8>, String> {
        // SAFETY: forwarded caller contract.
        let path = unsafe { parse_path(path, "path") }?;
        // SAFETY: forwarded caller contract.
        let msg = unsafe { parse_str(truncation_message, "truncation_message") }?;
        head_to_string_with_message(path, limit, msg)
            .map(String::into_bytes)
            .map_err(|e| e.to_string())
    })();
    FsUtilsResult::from_bytes(res)
}

/// Removes the contents of `folder_path`, keeping the folder itself.
///
/// # Safety
/// `folder_path` must be NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_cleanup_folder(folder_path: *const c_char) -> FsUtilsResult {
    // SAFETY: forwarded caller contract.
    let path = match unsafe { parse_path(folder_path, "folder_path") } {
        Ok(v) => v,
        Err(message) => return FsUtilsResult::err(message),
    };
    match cleanup_folder(path) {
        Ok(()) => FsUtilsResult::ok_empty(),
        Err(e) => FsUtilsResult::err(e.to_string()),
    }
}

/// Frees a string owned by a result. NULL is ignored.
///
/// # Safety
/// `ptr` must come from this library and not have been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        // SAFETY: produced by `CString::into_raw` in this crate.
        drop(unsafe { CString::from_raw(ptr) });
    }
}

/// Frees the buffer filled by `fs_utils_head` and resets it.
///
/// # Safety
/// `bytes` must be NULL or point to a value filled by `fs_utils_head`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_free_bytes(bytes: *mut FsUtilsBytes) {
    if bytes.is_null() {
        return;
    }
    // SAFETY: non-null per check; caller guarantees it is valid.
    let bytes = unsafe { &mut *bytes };
    if !bytes.data.is_null() {
        let raw_slice = std::ptr::slice_from_raw_parts_mut(bytes.data, bytes.length);
        // SAFETY: produced by `Box::<[u8]>::into_raw` with this length.
        drop(unsafe { Box::from_raw(raw_slice) });
    }
    bytes.data = std::ptr::null_mut();
    bytes.length = 0;
}

/// Frees whichever of `buffer` / `error` is set and nulls both.
///
/// # Safety
/// `result` must be NULL or point to a result returned by this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fs_utils_result_free(result: *mut FsUtilsResult) {
    if result.is_null() {
        return;
    }
    // SAFETY: non-null per check; caller guarantees it is valid.
    let result = unsafe { &mut *result };
    // SAFETY: both pointers are NULL or owned by this library.
    unsafe {
        fs_utils_free(result.buffer);
        fs_utils_free(result.error);
    }
    result.buffer = std::ptr::null_mut();
    result.error = std::ptr::null_mut();
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, CString, c_int};
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn c_path(path: &Path) -> CString {
        CString::new(path.to_str().expect("utf-8 path")).expect("c string")
    }

    fn take_buffer(mut result: FsUtilsResult) -> String {
        assert_eq!(result.status, EnumFsUtilsStatus::Ok);
        assert!(result.error.is_null());
        let txt = unsafe { CStr::from_ptr(result.buffer) }
            .to_str()
            .expect("utf-8")
            .to_string();
        unsafe { fs_utils_result_free(&mut result) };
        assert!(result.buffer.is_null());
        txt
    }

    fn take_error(mut result: FsUtilsResult) -> String {
        assert_eq!(result.status, EnumFsUtilsStatus::Error);
        assert!(result.buffer.is_null());
        let txt = unsafe { CStr::from_ptr(result.error) }
            .to_string_lossy()
            .into_owned();
        unsafe { fs_utils_result_free(&mut result) };
        assert!(result.error.is_null());
        txt
    }

    #[test]
    fn abi_version_is_stable() {
        assert_eq!(fs_utils_abi_version(), 1);
    }

    #[test]
    fn is_folder_empty_writes_flag() {
        let tmp = TempDir::new().expect("tempdir");
        let path = c_path(tmp.path());
        let mut is_empty: c_int = -1;

        let result = unsafe { fs_utils_is_folder_empty(path.as_ptr(), &mut is_empty) };
        assert_eq!(result.status, EnumFsUtilsStatus::Ok);
        assert!(result.buffer.is_null() && result.error.is_null());
        assert_eq!(is_empty, 1);

        std::fs::write(tmp.path().join("a.txt"), b"a").expect("write");
        let _ = unsafe { fs_utils_is_folder_empty(path.as_ptr(), &mut is_empty) };
        assert_eq!(is_empty, 0);
    }

    #[test]
    fn null_arguments_produce_error_results() {
        let mut is_empty: c_int = 0;
        let msg = take_error(unsafe { fs_utils_is_folder_empty(std::ptr::null(), &mut is_empty) });
        assert!(msg.contains("`path` is null"));

        let msg = take_error(unsafe {
            fs_utils_copy_directory(c"src".as_ptr(), std::ptr::null())
        });
        assert!(msg.contains("`destination_dir` is null"));

        let msg = take_error(unsafe {
            fs_utils_head_to_string_with_message(c"a.txt".as_ptr(), 3, std::ptr::null())
        });
        assert!(msg.contains("`truncation_message` is null"));
    }

    #[test]
    fn copy_directory_round_trip_and_collision() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("sub")).expect("mkdir");
        std::fs::write(src.join("sub/a.txt"), b"abc").expect("write");
        let dst_parent = tmp.path().join("dst");

        let c_src = c_path(&src);
        let c_dst = c_path(&dst_parent);
        let path_expected =
            take_buffer(unsafe { fs_utils_destination_directory(c_src.as_ptr(), c_dst.as_ptr()) });
        let path_copied =
            take_buffer(unsafe { fs_utils_copy_directory(c_src.as_ptr(), c_dst.as_ptr()) });
        assert_eq!(path_copied, path_expected);
        assert_eq!(
            std::fs::read(Path::new(&path_copied).join("sub/a.txt")).expect("read"),
            b"abc"
        );

        let msg = take_error(unsafe { fs_utils_copy_directory(c_src.as_ptr(), c_dst.as_ptr()) });
        assert!(msg.contains("Destination already exists"));
    }

    #[test]
    fn copy_directory_with_options_rejects_unknown_symlink_rule() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir");
        let c_src = c_path(&src);
        let c_dst = c_path(&tmp.path().join("dst"));

        let msg = take_error(unsafe {
            fs_utils_copy_directory_with_options(
                c_src.as_ptr(),
                c_dst.as_ptr(),
                c"follow".as_ptr(),
                8,
                false,
            )
        });
        assert!(msg.contains("Invalid symlink strategy"));

        let path_copied = take_buffer(unsafe {
            fs_utils_copy_directory_with_options(
                c_src.as_ptr(),
                c_dst.as_ptr(),
                c"skip_symlinks".as_ptr(),
                8,
                true,
            )
        });
        assert!(Path::new(&path_copied).is_dir());
    }

    #[test]
    fn destination_directory_invalid_source() {
        let msg = take_error(unsafe {
            fs_utils_destination_directory(c"/".as_ptr(), c"dst".as_ptr())
        });
        assert!(msg.starts_with("Invalid path"));
    }

    #[test]
    fn head_fills_and_frees_bytes() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, b"hello world").expect("write");
        let c_file = c_path(&path);

        let mut bytes = FsUtilsBytes {
            data: std::ptr::null_mut(),
            length: 0,
        };
        let result = unsafe { fs_utils_head(c_file.as_ptr(), 5, &mut bytes) };
        assert_eq!(result.status, EnumFsUtilsStatus::Ok);
        assert_eq!(bytes.length, 5);
        let raw = unsafe { std::slice::from_raw_parts(bytes.data, bytes.length) };
        assert_eq!(raw, b"hello");

        unsafe { fs_utils_free_bytes(&mut bytes) };
        assert!(bytes.data.is_null());
        assert_eq!(bytes.length, 0);
        unsafe { fs_utils_free_bytes(&mut bytes) };
    }

    #[test]
    fn head_to_string_with_message_example() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, b"hello world").expect("write");
        let c_file = c_path(&path);

        let txt = take_buffer(unsafe {
            fs_utils_head_to_string_with_message(c_file.as_ptr(), 5, c" [cut]".as_ptr())
        });
        assert_eq!(txt, "hello [cut]");
        let txt = take_buffer(unsafe {
            fs_utils_head_to_string_with_message(c_file.as_ptr(), 20, c" [cut]".as_ptr())
        });
        assert_eq!(txt, "hello world");
        let txt = take_buffer(unsafe { fs_utils_head_to_string(c_file.as_ptr(), 5) });
        assert_eq!(txt, "hello");
    }

    #[test]
    fn head_to_string_with_nul_byte_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("nul.bin");
        std::fs::write(&path, b"ab\0cd").expect("write");
        let c_file = c_path(&path);

        let msg = take_error(unsafe { fs_utils_head_to_string(c_file.as_ptr(), 16) });
        assert!(msg.contains("interior NUL byte at position 2"));
    }

    #[test]
    fn cleanup_folder_and_missing_path() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("a/b")).expect("mkdir");
        std::fs::write(tmp.path().join("a/b/c.txt"), b"c").expect("write");
        let c_dir = c_path(tmp.path());

        let result = unsafe { fs_utils_cleanup_folder(c_dir.as_ptr()) };
        assert_eq!(result.status, EnumFsUtilsStatus::Ok);
        assert!(tmp.path().is_dir());
        assert!(std::fs::read_dir(tmp.path()).expect("read").next().is_none());

        let c_missing = c_path(&tmp.path().join("absent"));
        let msg = take_error(unsafe { fs_utils_cleanup_folder(c_missing.as_ptr()) });
        assert!(msg.contains("absent"));
    }

    #[test]
    fn result_free_tolerates_null() {
        unsafe {
            fs_utils_result_free(std::ptr::null_mut());
            fs_utils_free(std::ptr::null_mut());
            fs_utils_free_bytes(std::ptr::null_mut());
        }
    }
}
