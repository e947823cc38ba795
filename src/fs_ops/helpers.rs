//! I/O error adapters.
//!
//! Turns a raw `io::Error` into an [`FsError`] that names the operation and path and
//! carries a platform-aware hint, so a failed migration step is actionable from the log alone.
//!
//! Usage:
//!   fs::create_dir(path).map_err(fs_error("create directory", path))?;

use std::io;
use std::path::Path;

use crate::errors::{FsError, FsErrorKind};

/// Hint keyed on the raw OS error code, when one is available.
fn hint_for_code(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => Some("permission denied; check ownership of both data roots"),
            libc::EXDEV => Some("cross-filesystem; rename not possible, a copy is required"),
            libc::EBUSY => Some("resource busy; close the application using the data directory"),
            libc::ENOENT => Some("path not found; it may already have been migrated"),
            libc::EEXIST | libc::ENOTEMPTY => Some("already exists; the destination entry is left untouched"),
            libc::ENOSPC => Some("insufficient space on the destination device"),
            libc::EROFS => Some("read-only filesystem; choose a writable destination"),
            libc::ELOOP => Some("too many symbolic link levels; possible symlink cycle"),
            libc::ENAMETOOLONG => Some("filename or path too long"),
            libc::EMFILE | libc::ENFILE => Some("file descriptor limit reached"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        match code {
            5 => Some("access denied; check permissions"),                      // ERROR_ACCESS_DENIED
            17 => Some("not same device; a copy is required"),                  // ERROR_NOT_SAME_DEVICE
            32 => Some("sharing violation; close the application using the file"), // ERROR_SHARING_VIOLATION
            2 | 3 => Some("path not found; it may already have been migrated"),  // FILE/PATH NOT FOUND
            80 | 183 => Some("already exists; the destination entry is left untouched"),
            112 => Some("insufficient disk space"),                             // ERROR_DISK_FULL
            206 => Some("filename or path too long"),                           // ERROR_FILENAME_EXCED_RANGE
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn hint_for_kind(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership of both data roots"),
        io::ErrorKind::NotFound => Some("path not found; it may already have been migrated"),
        io::ErrorKind::AlreadyExists => Some("already exists; the destination entry is left untouched"),
        _ => None,
    }
}

/// "<op> '<path>': <error>; <hint> [os code: N]"
pub(crate) fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    match e.raw_os_error() {
        Some(code) => {
            if let Some(hint) = hint_for_code(code) {
                msg.push_str("; ");
                msg.push_str(hint);
            }
            msg.push_str(&format!(" [os code: {}]", code));
        }
        None => {
            if let Some(hint) = hint_for_kind(e.kind()) {
                msg.push_str("; ");
                msg.push_str(hint);
            }
        }
    }
    msg
}

/// Returns a closure for `.map_err(...)` converting `io::Error` into a classified [`FsError`].
pub fn fs_error<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> FsError + 'a {
    move |e: io::Error| {
        let kind = FsErrorKind::of(&e);
        FsError::new(kind, op, path.to_path_buf(), build_message(op, path, &e), e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_op_and_path() {
        let p = Path::new("/nonexistent/data");
        let err = fs_error("rename", p)(io::Error::from(io::ErrorKind::NotFound));
        let msg = err.to_string();
        assert!(msg.contains("rename"));
        assert!(msg.contains("/nonexistent/data"));
        assert!(msg.contains("already have been migrated"));
        assert_eq!(err.kind, FsErrorKind::NotFound);
        assert_eq!(err.op, "rename");
    }

    #[cfg(unix)]
    #[test]
    fn raw_codes_add_hint_and_code() {
        let p = Path::new("/tmp");
        let err = fs_error("copy", p)(io::Error::from_raw_os_error(libc::ENOSPC));
        let msg = err.to_string();
        assert!(msg.contains("insufficient space"), "msg was: {}", msg);
        assert!(msg.contains("os code"));
        assert_eq!(err.kind, FsErrorKind::Unknown);
    }

    #[cfg(unix)]
    #[test]
    fn exdev_is_classified_cross_device() {
        let p = Path::new("/tmp");
        let err = fs_error("rename", p)(io::Error::from_raw_os_error(libc::EXDEV));
        assert_eq!(err.kind, FsErrorKind::CrossDevice);
        assert!(err.to_string().contains("cross-filesystem"));
    }
}
