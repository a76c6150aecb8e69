//! Copy/read specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopySymlinkStrategy {
    /// Follow the link and copy the target bytes/entries.
    Dereference,
    /// Create a symbolic link at destination (do not copy target bytes).
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Default value of [`SpecCopyDirOptions::depth_max`].
pub const N_COPY_DEPTH_MAX_DEFAULT: usize = 256;

/// Input options for `copy_directory_with_options`.
#[derive(Debug, Clone)]
pub struct SpecCopyDirOptions {
    /// Symlink handling behavior.
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Deepest directory level (source root is level 0) the walk may enter.
    pub depth_max: usize,
    /// Copy access/modification times onto destination files.
    pub if_keep_times: bool,
}

impl Default for SpecCopyDirOptions {
    fn default() -> Self {
        Self {
            rule_symlink: EnumCopySymlinkStrategy::Dereference,
            depth_max: N_COPY_DEPTH_MAX_DEFAULT,
            if_keep_times: false,
        }
    }
}

/// Bounded prefix of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecByteWindow {
    /// At most `limit` leading bytes of the file.
    pub bytes: Vec<u8>,
    /// `true` iff the file holds more than `limit` bytes.
    pub if_truncated: bool,
}

impl SpecByteWindow {
    /// Number of bytes held in the window.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the window holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Release the byte buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Errors returned by every fallible `fs_utils` operation.
#[derive(Debug, Error)]
pub enum FsUtilsError {
    /// The effective destination could not be derived.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    /// The effective destination is already present on disk.
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// The effective destination lies inside the source tree.
    #[error(
        "Destination is inside the source directory: {} <-> {}",
        .source_dir.display(),
        .destination.display()
    )]
    SourceDestinationOverlap {
        /// Source directory as given.
        source_dir: PathBuf,
        /// Effective destination directory.
        destination: PathBuf,
    },
    /// Invalid `depth_max` option.
    #[error("{0}")]
    InvalidDepthLimit(String),
    /// The walk reached a directory nested deeper than `depth_max`.
    #[error("Directory depth limit ({depth_max}) exceeded at {}", .path.display())]
    DepthLimitExceeded {
        /// First directory beyond the limit.
        path: PathBuf,
        /// Configured limit.
        depth_max: usize,
    },
    /// A dereferenced symlink led back to a directory being walked.
    #[error("Symlink loop detected: {}", .0.display())]
    SymlinkLoop(PathBuf),
    /// Underlying filesystem failure.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path the failing operation was applied to.
        path: PathBuf,
        /// OS-provided error.
        #[source]
        source: io::Error,
    },
}

impl FsUtilsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for `fs_utils` operations.
pub type Result<T> = std::result::Result<T, FsUtilsError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
