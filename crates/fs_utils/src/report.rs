//! Copy report models and mutable report builder.

use std::fmt;
use std::path::PathBuf;

/// Aggregate counters for one `copy_directory_with_options` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCopyDir {
    /// Effective destination directory that received the copy.
    pub path_dir_dst: PathBuf,
    /// Directories created, including the destination root.
    pub cnt_dirs: u64,
    /// Regular files copied.
    pub cnt_files: u64,
    /// Symbolic links recreated at destination.
    pub cnt_symlinks: u64,
    /// Entries skipped (special files, ignored symlinks).
    pub cnt_skipped: u64,
    /// Total bytes written by file copies.
    pub n_bytes: u64,
}

impl ReportCopyDir {
    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dst={} dirs={} files={} symlinks={} skipped={} bytes={}",
            self.path_dir_dst.display(),
            self.cnt_dirs,
            self.cnt_files,
            self.cnt_symlinks,
            self.cnt_skipped,
            self.n_bytes
        )
    }
}

impl fmt::Display for ReportCopyDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyDirBuilder {
    /// See [`ReportCopyDir::cnt_dirs`].
    pub cnt_dirs: u64,
    /// See [`ReportCopyDir::cnt_files`].
    pub cnt_files: u64,
    /// See [`ReportCopyDir::cnt_symlinks`].
    pub cnt_symlinks: u64,
    /// See [`ReportCopyDir::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportCopyDir::n_bytes`].
    pub n_bytes: u64,
}

impl ReportCopyDirBuilder {
    /// Increment directory count by one.
    pub fn add_dir(&mut self) {
        self.cnt_dirs += 1;
    }

    /// Increment file count by one and add its size.
    pub fn add_file(&mut self, n_bytes: u64) {
        self.cnt_files += 1;
        self.n_bytes += n_bytes;
    }

    /// Increment symlink count by one.
    pub fn add_symlink(&mut self) {
        self.cnt_symlinks += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Finalize builder into immutable report.
    pub fn build(self, path_dir_dst: PathBuf) -> ReportCopyDir {
        ReportCopyDir {
            path_dir_dst,
            cnt_dirs: self.cnt_dirs,
            cnt_files: self.cnt_files,
            cnt_symlinks: self.cnt_symlinks,
            cnt_skipped: self.cnt_skipped,
            n_bytes: self.n_bytes,
        }
    }
}
