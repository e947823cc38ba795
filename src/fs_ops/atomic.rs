//! Rename helper.
//! - Never overwrites: an existing destination is reported as `AlreadyExists`.
//! - On Unix, best-effort fsync of the destination directory after rename.

use std::fs;
use std::io;
use std::path::Path;

use super::helpers::fs_error;
use super::util::fsync_dir;
use crate::errors::FsError;

pub(super) fn rename_no_clobber(src: &Path, dst: &Path) -> Result<(), FsError> {
    // rename(2) silently replaces files and empty directories; refuse instead.
    if fs::symlink_metadata(dst).is_ok() {
        return Err(fs_error("rename", dst)(io::Error::from(io::ErrorKind::AlreadyExists)));
    }

    fs::rename(src, dst).map_err(fs_error("rename", src))?;

    if let Some(parent) = dst.parent() {
        // Ignore fsync errors to avoid turning a successful rename into a failure.
        let _ = fsync_dir(parent);
    }
    Ok(())
}

/// Rename that is allowed to replace an existing file (used for atomic text writes).
pub(super) fn rename_replace(src: &Path, dst: &Path) -> Result<(), FsError> {
    fs::rename(src, dst).map_err(fs_error("rename", src))?;
    if let Some(parent) = dst.parent() {
        let _ = fsync_dir(parent);
    }
    Ok(())
}
