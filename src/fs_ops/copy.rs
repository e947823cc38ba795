//! Copy helpers used by the marker commit and the cross-device fallback.
//! - Files are copied to a hidden temp sibling, synced, then renamed into place.
//! - Trees are copied with the same temp-then-rename shape at the directory level,
//!   so the destination either does not exist or is complete.
//! - Modification times are carried over; attachment mtimes matter to sync tools.

use filetime::{set_file_mtime, FileTime};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use super::atomic::rename_no_clobber;
use super::helpers::fs_error;
use super::space::{ensure_space_for_copy, format_bytes, tree_size};
use super::util::staging_path;
use crate::errors::FsError;

fn copy_mtime(src: &Path, dst: &Path) {
    if let Ok(meta) = fs::metadata(src) {
        let _ = set_file_mtime(dst, FileTime::from_last_modification_time(&meta));
    }
}

/// Copy one file without ever clobbering `dst`.
pub(super) fn copy_file_safe(src: &Path, dst: &Path) -> Result<(), FsError> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(fs_error("copy file", dst)(io::Error::from(io::ErrorKind::AlreadyExists)));
    }
    let tmp = staging_path(dst);
    let copied = fs::copy(src, &tmp)
        .map_err(fs_error("copy file", src))
        .and_then(|_| {
            fs::File::open(&tmp)
                .and_then(|f| f.sync_all())
                .map_err(fs_error("sync file", &tmp))
        });
    if let Err(e) = copied {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    copy_mtime(src, &tmp);
    if let Err(e) = rename_no_clobber(&tmp, dst) {
        // Best-effort cleanup of the temp file on failure.
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Copy the tree at `src` to `dst`. `dst` must not exist.
/// On failure the staging directory is removed and `dst` is left absent.
pub(super) fn copy_tree(src: &Path, dst: &Path) -> Result<(), FsError> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(fs_error("copy tree", dst)(io::Error::from(io::ErrorKind::AlreadyExists)));
    }
    if fs::metadata(src).map_err(fs_error("copy tree", src))?.is_file() {
        return copy_file_safe(src, dst);
    }

    if let Some(parent) = dst.parent() {
        let required = tree_size(src);
        ensure_space_for_copy(parent, required)?;
        debug!(src = %src.display(), bytes = required, size = %format_bytes(required), "copying tree");
    }

    let staging = staging_path(dst);
    let result = copy_tree_into(src, &staging).and_then(|()| rename_no_clobber(&staging, dst));
    if result.is_err() {
        let _ = fs::remove_dir_all(&staging);
    }
    result
}

fn copy_tree_into(src: &Path, target: &Path) -> Result<(), FsError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            fs_error("walk directory", &path)(io::Error::from(e))
        })?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let dst = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst).map_err(fs_error("create directory", &dst))?;
        } else {
            files.push((entry.into_path(), dst));
        }
    }

    // Directories exist now; file copies are independent of each other.
    files.par_iter().try_for_each(|(from, to)| -> Result<(), FsError> {
        fs::copy(from, to).map_err(fs_error("copy file", from))?;
        copy_mtime(from, to);
        Ok(())
    })
}
