//! Filesystem primitives.
//!
//! The migration engine never touches `std::fs` directly; it goes through [`FileOps`] so
//! tests can inject failures for a single entry and hosts can substitute their own I/O.
//! [`StdFs`] is the real implementation.

mod atomic;
mod copy;
mod helpers;
mod lock;
mod space;
mod util;

pub use helpers::fs_error;
pub use lock::{acquire_run_lock, RunLock};
pub use util::is_cross_device;
pub(crate) use util::{is_staging_name, staging_path};

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::errors::FsError;

/// Primitive file operations consumed by the detector, marker and mover.
pub trait FileOps {
    /// True if anything (file, directory, symlink) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Create a single directory. Fails with `AlreadyExists` if present.
    fn make_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Move `src` to `dst` with a single rename. Never overwrites an existing `dst`.
    /// Cross-filesystem renames fail with `CrossDevice`; callers decide whether to copy.
    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError>;

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), FsError>;

    /// Copy a file or directory tree to a `dst` that must not exist yet.
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), FsError>;

    /// Remove a file or directory tree. A missing path is not an error.
    fn remove_recursive(&self, path: &Path) -> Result<(), FsError>;

    /// Entry names of a directory, sorted lexicographically.
    fn list_dir(&self, path: &Path) -> Result<Vec<OsString>, FsError>;

    fn read_text(&self, path: &Path) -> Result<String, FsError>;

    /// Replace the contents of `path` atomically (temp sibling + rename).
    fn write_text(&self, path: &Path, contents: &str) -> Result<(), FsError>;
}

/// [`FileOps`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl FileOps for StdFs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    fn make_dir(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir(path).map_err(fs_error("create directory", path))
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        atomic::rename_no_clobber(src, dst)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        copy::copy_file_safe(src, dst)
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        copy::copy_tree(src, dst)
    }

    fn remove_recursive(&self, path: &Path) -> Result<(), FsError> {
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(fs_error("stat", path)(e)),
        };
        let res = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match res {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other.map_err(fs_error("remove", path)),
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<OsString>, FsError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(fs_error("read directory", path))? {
            let entry = entry.map_err(fs_error("read directory", path))?;
            names.push(entry.file_name());
        }
        names.sort();
        Ok(names)
    }

    fn read_text(&self, path: &Path) -> Result<String, FsError> {
        fs::read_to_string(path).map_err(fs_error("read file", path))
    }

    fn write_text(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        let tmp = staging_path(path);
        let written = fs::File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(contents.as_bytes())?;
                f.sync_all()
            })
            .map_err(fs_error("write file", &tmp));
        let result = written.and_then(|()| atomic::rename_replace(&tmp, path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}
