//! `fs_utils` v1:
//! Small blocking filesystem primitives.
//!
//! Modules:
//! - `copy`   : directory copy into a derived destination
//! - `read`   : bounded file reads as bytes or text
//! - `folder` : emptiness check and content-only cleanup
//! - `spec`   : enums/options/errors
//! - `report` : copy report model
//! - `util`   : shared path helpers

pub mod copy;
pub mod folder;
pub mod read;
pub mod report;
pub mod spec;
mod util;

pub use copy::{copy_directory, copy_directory_with_options, destination_directory};
pub use folder::{cleanup_folder, is_folder_empty};
pub use read::{
    decode_byte_window, head, head_to_string, head_to_string_with_message, read_head_bytes,
};
pub use report::{ReportCopyDir, ReportCopyDirBuilder};
pub use spec::{
    EnumCopySymlinkStrategy, FsUtilsError, N_COPY_DEPTH_MAX_DEFAULT, Result, SpecByteWindow,
    SpecCopyDirOptions,
};
