//! Directory tree copy into a derived destination.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::report::{ReportCopyDir, ReportCopyDirBuilder};
use crate::spec::{EnumCopySymlinkStrategy, FsUtilsError, Result, SpecCopyDirOptions};
use crate::util::{
    copy_file_contents, create_symbolic_link, derive_destination_path, dir_identity,
    is_destination_inside_source,
};

#[derive(Debug)]
struct SpecCopyContext {
    spec_cp_options: SpecCopyDirOptions,
    builder_cp_report: ReportCopyDirBuilder,
    /// `(dev, ino)` of every directory from the source root to the one being walked.
    l_ancestors: Vec<(u64, u64)>,
}

/// Compute the effective destination `destination_parent / basename(source_dir)`.
///
/// Pure path computation; the filesystem is not touched.
///
/// # Errors
/// [`FsUtilsError::InvalidPath`] when `source_dir` has no final normal
/// component (empty, root, `.` or ending in `..`) or `destination_parent` is
/// empty.
///
/// # Examples
/// ```
/// use std::path::Path;
/// let path_dst = fs_utils::destination_directory("data/src", "backup").unwrap();
/// assert_eq!(path_dst, Path::new("backup/src"));
/// ```
pub fn destination_directory<P, Q>(source_dir: P, destination_parent: Q) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    derive_destination_path(source_dir.as_ref(), destination_parent.as_ref())
}

/// Copy `source_dir` into a new `destination_parent/<basename>` directory.
///
/// Equivalent to [`copy_directory_with_options`] with default options;
/// returns the effective destination. A missing `destination_parent` is
/// created rather than reported as an error.
pub fn copy_directory<P, Q>(source_dir: P, destination_parent: Q) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    copy_directory_with_options(
        source_dir,
        destination_parent,
        SpecCopyDirOptions::default(),
    )
    .map(|report| report.path_dir_dst)
}

/// Copy a directory tree from `source_dir` into `destination_parent`.
///
/// A new subdirectory named after the basename of `source_dir` is created in
/// `destination_parent`. The copy is refused when that subdirectory, or
/// anything else at that path, already exists; nothing is ever merged or
/// overwritten.
///
/// A missing `destination_parent` is not an error: it is created together
/// with any missing ancestors (as `create_dir_all`), so a mistyped parent
/// yields a new directory chain rather than [`FsUtilsError::Io`].
///
/// This function performs:
/// 1. Destination derivation and collision check.
/// 2. Source validation (must be a directory not containing the destination).
/// 3. Creation of the destination root.
/// 4. Recursive walk, creating directories and copying file bytes verbatim.
///
/// The walk aborts on the first failure. Entries copied before it are kept,
/// so the destination may be partially populated; callers needing atomicity
/// should copy into a temporary parent and rename.
pub fn copy_directory_with_options<P, Q>(
    source_dir: P,
    destination_parent: Q,
    spec_cp_options: SpecCopyDirOptions,
) -> Result<ReportCopyDir>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    if spec_cp_options.depth_max == 0 {
        return Err(FsUtilsError::InvalidDepthLimit(
            "Arg `depth_max` must be >= 1.".to_string(),
        ));
    }

    let path_dir_src = source_dir.as_ref();
    let path_dir_dst = derive_destination_path(path_dir_src, destination_parent.as_ref())?;

    match fs::symlink_metadata(&path_dir_dst) {
        Ok(_) => return Err(FsUtilsError::DestinationExists(path_dir_dst)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(FsUtilsError::io(path_dir_dst, e)),
    }

    let meta_dir_src =
        fs::metadata(path_dir_src).map_err(|e| FsUtilsError::io(path_dir_src, e))?;
    if !meta_dir_src.is_dir() {
        return Err(FsUtilsError::SourceNotDirectory(path_dir_src.to_path_buf()));
    }
    if is_destination_inside_source(path_dir_src, &path_dir_dst) {
        return Err(FsUtilsError::SourceDestinationOverlap {
            source_dir: path_dir_src.to_path_buf(),
            destination: path_dir_dst,
        });
    }

    debug!(
        source = %path_dir_src.display(),
        destination = %path_dir_dst.display(),
        rule_symlink = ?spec_cp_options.rule_symlink,
        "copy_directory start"
    );

    if let Some(path_parent_dst) = path_dir_dst.parent() {
        fs::create_dir_all(path_parent_dst)
            .map_err(|e| FsUtilsError::io(path_parent_dst, e))?;
    }
    fs::create_dir(&path_dir_dst).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            FsUtilsError::DestinationExists(path_dir_dst.clone())
        } else {
            FsUtilsError::io(path_dir_dst.clone(), e)
        }
    })?;

    let mut spec_cp_ctx = SpecCopyContext {
        spec_cp_options,
        builder_cp_report: ReportCopyDirBuilder::default(),
        l_ancestors: Vec::new(),
    };
    spec_cp_ctx.builder_cp_report.add_dir();
    if spec_cp_ctx.spec_cp_options.rule_symlink == EnumCopySymlinkStrategy::Dereference
        && let Some(tuple_dir_identifier) = dir_identity(&meta_dir_src)
    {
        spec_cp_ctx.l_ancestors.push(tuple_dir_identifier);
    }

    walk_directory(path_dir_src, &path_dir_dst, 0, &mut spec_cp_ctx)?;

    let report = spec_cp_ctx.builder_cp_report.build(path_dir_dst);
    debug!(%report, "copy_directory done");
    Ok(report)
}

fn walk_directory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    n_depth: usize,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<()> {
    let iter_entries =
        fs::read_dir(path_dir_src).map_err(|e| FsUtilsError::io(path_dir_src, e))?;

    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| FsUtilsError::io(path_dir_src, e))?;
        let path_entry_src = entry.path();
        let path_entry_dst = path_dir_dst.join(entry.file_name());
        let cfg_file_type = entry
            .file_type()
            .map_err(|e| FsUtilsError::io(&path_entry_src, e))?;

        let b_is_symlink = cfg_file_type.is_symlink();
        if b_is_symlink {
            match spec_cp_ctx.spec_cp_options.rule_symlink {
                EnumCopySymlinkStrategy::SkipSymlinks => {
                    trace!(path = %path_entry_src.display(), "symlink skipped");
                    spec_cp_ctx.builder_cp_report.add_skipped();
                    continue;
                }
                EnumCopySymlinkStrategy::CopySymlinks => {
                    create_symbolic_link(&path_entry_src, &path_entry_dst)
                        .map_err(|e| FsUtilsError::io(&path_entry_dst, e))?;
                    spec_cp_ctx.builder_cp_report.add_symlink();
                    continue;
                }
                EnumCopySymlinkStrategy::Dereference => {}
            }
        }

        let (b_is_dir, b_is_file) = if b_is_symlink {
            let meta_target = fs::metadata(&path_entry_src)
                .map_err(|e| FsUtilsError::io(&path_entry_src, e))?;
            (meta_target.is_dir(), meta_target.is_file())
        } else {
            (cfg_file_type.is_dir(), cfg_file_type.is_file())
        };

        if b_is_dir {
            copy_subdirectory(&path_entry_src, &path_entry_dst, n_depth + 1, spec_cp_ctx)?;
        } else if b_is_file {
            let n_bytes = copy_file_contents(
                &path_entry_src,
                &path_entry_dst,
                spec_cp_ctx.spec_cp_options.if_keep_times,
            )
            .map_err(|e| FsUtilsError::io(&path_entry_dst, e))?;
            trace!(path = %path_entry_dst.display(), n_bytes, "file copied");
            spec_cp_ctx.builder_cp_report.add_file(n_bytes);
        } else {
            trace!(path = %path_entry_src.display(), "special file skipped");
            spec_cp_ctx.builder_cp_report.add_skipped();
        }
    }

    Ok(())
}

fn copy_subdirectory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    n_depth: usize,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<()> {
    let depth_max = spec_cp_ctx.spec_cp_options.depth_max;
    if n_depth > depth_max {
        return Err(FsUtilsError::DepthLimitExceeded {
            path: path_dir_src.to_path_buf(),
            depth_max,
        });
    }

    let mut tuple_dir_identifier = None;
    if spec_cp_ctx.spec_cp_options.rule_symlink == EnumCopySymlinkStrategy::Dereference {
        let meta_dir_src =
            fs::metadata(path_dir_src).map_err(|e| FsUtilsError::io(path_dir_src, e))?;
        tuple_dir_identifier = dir_identity(&meta_dir_src);
    }
    if let Some(tuple_dir_identifier) = tuple_dir_identifier {
        if spec_cp_ctx.l_ancestors.contains(&tuple_dir_identifier) {
            return Err(FsUtilsError::SymlinkLoop(path_dir_src.to_path_buf()));
        }
        spec_cp_ctx.l_ancestors.push(tuple_dir_identifier);
    }

    fs::create_dir(path_dir_dst).map_err(|e| FsUtilsError::io(path_dir_dst, e))?;
    spec_cp_ctx.builder_cp_report.add_dir();
    walk_directory(path_dir_src, path_dir_dst, n_depth, spec_cp_ctx)?;

    if tuple_dir_identifier.is_some() {
        spec_cp_ctx.l_ancestors.pop();
    }
    Ok(())
}
